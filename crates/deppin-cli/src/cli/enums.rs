use clap::ValueEnum;

/// Serialization of the printed graph
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Canonical pretty-printed JSON
    #[default]
    #[value(name = "json")]
    Json,

    /// Graphviz DOT
    #[value(name = "dot")]
    Dot,
}

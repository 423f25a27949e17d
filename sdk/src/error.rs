use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("no SDK description file in {}", .0.display())]
    MissingDescription(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed SDK description {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("SDK description {} has no <{element}>", path.display())]
    MissingElement {
        path: PathBuf,
        element: &'static str,
    },

    #[error("no Java runtime found; set JAVA_HOME or [java] path")]
    JavaNotFound,
}

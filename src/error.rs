use std::fmt::Display;

#[derive(Debug)]
pub enum MeshPlotError {
    Input(String),
    Parse(String),
    Render(String),
    Export(String),
}

impl Display for MeshPlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (err_name, value) = match self {
            MeshPlotError::Input(v) => ("Input", v),
            MeshPlotError::Parse(v) => ("Parse", v),
            MeshPlotError::Render(v) => ("Render", v),
            MeshPlotError::Export(v) => ("Export", v),
        };

        write!(f, "{} error: {}", err_name, value)
    }
}

impl std::error::Error for MeshPlotError {}

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::ReviewError;
use crate::model::CatalogRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Beam,
    Synthesis,
}

impl CurveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beam => "beam",
            Self::Synthesis => "synthesis",
        }
    }

    pub fn columns(self) -> (&'static str, &'static str) {
        match self {
            Self::Beam => ("freq", "TABL"),
            Self::Synthesis => ("freq", "FLUXBL"),
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait PlotRenderer {
    fn render(&mut self, path: &Path, kind: CurveKind) -> Result<(), ReviewError>;
}

#[derive(Debug, Default)]
pub struct TraceRenderer {
    rendered: usize,
}

impl TraceRenderer {
    pub fn rendered(&self) -> usize {
        self.rendered
    }
}

impl PlotRenderer for TraceRenderer {
    fn render(&mut self, path: &Path, kind: CurveKind) -> Result<(), ReviewError> {
        let metadata = fs::metadata(path).map_err(|err| {
            ReviewError::DataFormat(format!(
                "cannot read {kind} spectrum {}: {err}",
                path.display()
            ))
        })?;
        if !metadata.is_file() {
            return Err(ReviewError::DataFormat(format!(
                "{kind} spectrum {} is not a file",
                path.display()
            )));
        }

        let (x_column, y_column) = kind.columns();
        info!(
            path = %path.display(),
            kind = %kind,
            x = x_column,
            y = y_column,
            bytes = metadata.len(),
            "plot requested"
        );
        self.rendered += 1;
        Ok(())
    }
}

pub fn render_record(
    renderer: &mut dyn PlotRenderer,
    record: Option<&CatalogRecord>,
) -> Result<(), ReviewError> {
    let record = record.ok_or(ReviewError::NoCurrentRecord)?;

    for beam in &record.beam_paths {
        renderer.render(Path::new(beam), CurveKind::Beam)?;
    }
    renderer.render(Path::new(&record.synthesis_path), CurveKind::Synthesis)
}

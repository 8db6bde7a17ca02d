use std::path::Path;

use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::PolarsError;

use crate::helper_functions::extension_of;

pub mod any_dataset;
pub mod excel;

use any_dataset::DelimitedDataset;
use excel::ExcelDataset;

/// A source that yields the enrichment table.
pub trait Dataset {
    fn load(&self) -> PolarsResult<DataFrame>;
}

/// Pick the loader from the file extension.
pub fn dataset_for(path: &Path, sheet: usize) -> PolarsResult<Box<dyn Dataset>> {
    match extension_of(path).as_str() {
        "csv" | "tsv" | "txt" => Ok(Box::new(DelimitedDataset {
            path: path.to_path_buf(),
        })),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Box::new(ExcelDataset {
            path: path.to_path_buf(),
            sheet,
        })),
        other => Err(PolarsError::ComputeError(
            format!(
                "unsupported input format `{other}` for {} (expected csv, tsv, txt, xlsx, xls or ods)",
                path.display()
            )
            .into(),
        )),
    }
}

pub fn load_table(path: &Path, sheet: usize) -> PolarsResult<DataFrame> {
    dataset_for(path, sheet)?.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = dataset_for(Path::new("enrichment.json"), 0).err().unwrap();
        assert!(err.to_string().contains("unsupported input format"));
    }

    #[test]
    fn loads_by_extension() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(f, "Category\tTerm\tCount\t%\tPValue").unwrap();
        writeln!(f, "KEGG_PATHWAY\thsa00010:Glycolysis\t12\t4.5\t0.0012").unwrap();
        let df = load_table(f.path(), 0).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_table(Path::new("/nonexistent/enrichment.csv"), 0).is_err());
    }
}

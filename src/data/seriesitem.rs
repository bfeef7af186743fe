use std::path::Path;

use burn::data::dataset::{Dataset, InMemDataset};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One series as stored on disk, one JSON object per line.
///
/// `feat_dynamic_real` is `[n_exogenous][len]`, aligned with `target`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeriesItem {
    pub item_id: String,
    pub target: Vec<f32>,
    #[serde(default)]
    pub observed_values: Option<Vec<f32>>,
    #[serde(default)]
    pub sample_mask: Option<Vec<f32>>,
    #[serde(default)]
    pub feat_static_real: Option<Vec<f32>>,
    #[serde(default)]
    pub feat_dynamic_real: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub freq: Option<String>,
}

impl SeriesItem {
    pub fn new(item_id: impl Into<String>, target: Vec<f32>) -> Self {
        Self {
            item_id: item_id.into(),
            target,
            observed_values: None,
            sample_mask: None,
            feat_static_real: None,
            feat_dynamic_real: None,
            freq: None,
        }
    }

    pub fn with_observed_values(mut self, observed_values: Vec<f32>) -> Self {
        self.observed_values = Some(observed_values);
        self
    }

    pub fn with_sample_mask(mut self, sample_mask: Vec<f32>) -> Self {
        self.sample_mask = Some(sample_mask);
        self
    }

    pub fn with_static(mut self, feat_static_real: Vec<f32>) -> Self {
        self.feat_static_real = Some(feat_static_real);
        self
    }

    pub fn with_dynamic(mut self, feat_dynamic_real: Vec<Vec<f32>>) -> Self {
        self.feat_dynamic_real = Some(feat_dynamic_real);
        self
    }

    pub fn with_freq(mut self, freq: impl Into<String>) -> Self {
        self.freq = Some(freq.into());
        self
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn n_static(&self) -> usize {
        self.feat_static_real.as_ref().map_or(0, Vec::len)
    }

    pub fn n_exogenous(&self) -> usize {
        self.feat_dynamic_real.as_ref().map_or(0, Vec::len)
    }

    /// Checks every per-step vector against the target length.
    pub(crate) fn validate(&self) -> Result<(), DataError> {
        let expected = self.target.len();
        let check = |field: &'static str, actual: usize| {
            if actual == expected {
                Ok(())
            } else {
                Err(DataError::LengthMismatch {
                    item_id: self.item_id.clone(),
                    field,
                    expected,
                    actual,
                })
            }
        };

        if let Some(values) = &self.observed_values {
            check("observed_values", values.len())?;
        }
        if let Some(values) = &self.sample_mask {
            check("sample_mask", values.len())?;
        }
        if let Some(features) = &self.feat_dynamic_real {
            for feature in features {
                check("feat_dynamic_real", feature.len())?;
            }
        }

        Ok(())
    }
}

pub fn load_from_file<P: AsRef<Path>>(filename: P) -> Result<Vec<SeriesItem>, DataError> {
    let dataset: InMemDataset<SeriesItem> = InMemDataset::from_json_rows(filename)?;
    Ok(dataset.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_reports_offending_field() {
        let item = SeriesItem::new("a", vec![1.0, 2.0, 3.0]).with_dynamic(vec![vec![0.0; 2]]);
        match item.validate() {
            Err(DataError::LengthMismatch {
                field,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(field, "feat_dynamic_real");
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loads_json_rows_with_missing_optionals() {
        let path = std::env::temp_dir().join(format!("tsloader-items-{}.jsonl", std::process::id()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, r#"{{"item_id": "a", "target": [1.0, 2.0], "freq": "D"}}"#).unwrap();
            writeln!(
                file,
                r#"{{"item_id": "b", "target": [3.0], "feat_static_real": [0.5]}}"#
            )
            .unwrap();
        }

        let items = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].freq.as_deref(), Some("D"));
        assert_eq!(items[1].n_static(), 1);
        assert!(items[1].observed_values.is_none());
    }
}

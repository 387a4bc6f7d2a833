//! Mapping between the technology labels used in this crate and the market (variable) names
//! an integrated assessment model (IAM) reports electricity generation under.

use crate::imports::*;

/// Technology label → IAM market variable, for one IAM.
///
/// Entries keep the order in which their technology label first appeared in the source file;
/// a later row for the same technology label overwrites the market variable in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricityMarketLabels {
    /// IAM identifier the labels were loaded for, e.g. `remind`
    pub model: String,
    labels: Vec<(String, String)>,
}

impl ElectricityMarketLabels {
    /// Loads the labels of `model` from the mapping file packaged with the crate.
    #[cfg(feature = "resources")]
    pub fn load(model: &str) -> anyhow::Result<Self> {
        use crate::resources::{ELECTRICITY_MARKETS_FILE, RESOURCES_DIR};
        let file = RESOURCES_DIR
            .get_file(ELECTRICITY_MARKETS_FILE)
            .with_context(|| format!("File not found in resources: {ELECTRICITY_MARKETS_FILE:?}"))?;
        Self::from_reader(file.contents(), model)
    }

    /// Loads the labels of `model` from a semicolon-delimited mapping file with rows of
    /// `model;technology;market`.
    pub fn from_file<P: AsRef<Path>>(filepath: P, model: &str) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        utils::check_file(filepath)?;
        let file = File::open(filepath)
            .with_context(|| format!("Could not open file: {filepath:?}"))?;
        Self::from_reader(file, model).with_context(|| format!("{filepath:?}"))
    }

    /// Reads mapping rows from `rdr`, keeping those whose first field equals `model`.
    ///
    /// An unknown `model` gives an empty mapping; see [`Self::is_empty`].
    pub fn from_reader<R: std::io::Read>(rdr: R, model: &str) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);
        let mut labels = Self {
            model: model.to_string(),
            labels: Vec::new(),
        };
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if record.get(0) != Some(model) {
                continue;
            }
            match (record.get(1), record.get(2)) {
                (Some(technology), Some(market)) => labels.insert(technology, market),
                _ => bail!(CarculatorError::MalformedTable(format!(
                    "label mapping row {} has fewer than three fields",
                    i + 1
                ))),
            }
        }
        if labels.is_empty() {
            log::warn!("No electricity market labels found for model {model:?}");
        } else {
            log::debug!("Loaded {} electricity market labels for {model:?}", labels.len());
        }
        Ok(labels)
    }

    fn insert(&mut self, technology: &str, market: &str) {
        match self.labels.iter_mut().find(|(t, _)| t == technology) {
            Some((_, m)) => *m = market.to_string(),
            None => self
                .labels
                .push((technology.to_string(), market.to_string())),
        }
    }

    /// Market variable of `technology`, if mapped
    pub fn get(&self, technology: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(t, _)| t == technology)
            .map(|(_, m)| m.as_str())
    }

    /// Whether `market` is one of the mapped market variables
    pub fn contains_market(&self, market: &str) -> bool {
        self.labels.iter().any(|(_, m)| m == market)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(technology, market)` pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(t, m)| (t.as_str(), m.as_str()))
    }

    /// Market variable → technology label.
    ///
    /// When two technologies share a market variable the later one wins; the collision is
    /// logged since the mapping file cannot express it unambiguously.
    pub fn inverse(&self) -> HashMap<String, String> {
        let mut inverse = HashMap::with_capacity(self.labels.len());
        for (technology, market) in self.iter() {
            if let Some(previous) = inverse.insert(market.to_string(), technology.to_string()) {
                log::warn!(
                    "Market {market:?} is mapped to both {previous:?} and {technology:?}, keeping {technology:?}"
                );
            }
        }
        inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = "\
remind;Coal PC;SE|Electricity|Coal|PC|w/o CCS
image;Coal PC;Secondary Energy|Electricity|Coal|w/o CCS|1
remind;Hydro;SE|Electricity|Hydro
remind;Coal PC;SE|Electricity|Coal|PC
";

    #[test]
    fn test_keeps_only_rows_of_model() {
        let labels = ElectricityMarketLabels::from_reader(MAPPING.as_bytes(), "image").unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(
            labels.get("Coal PC"),
            Some("Secondary Energy|Electricity|Coal|w/o CCS|1")
        );
    }

    #[test]
    fn test_last_row_wins_for_duplicate_technology() {
        let labels = ElectricityMarketLabels::from_reader(MAPPING.as_bytes(), "remind").unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("Coal PC"), Some("SE|Electricity|Coal|PC"));
        // position of the first occurrence is kept
        assert_eq!(labels.iter().next().unwrap().0, "Coal PC");
    }

    #[test]
    fn test_unknown_model_gives_empty_mapping() {
        let labels = ElectricityMarketLabels::from_reader(MAPPING.as_bytes(), "message").unwrap();
        assert!(labels.is_empty());
        let labels = ElectricityMarketLabels::from_reader(MAPPING.as_bytes(), "").unwrap();
        assert!(labels.is_empty());
    }

    #[test]
    fn test_short_row_for_model_is_an_error() {
        let err = ElectricityMarketLabels::from_reader("remind;Hydro\n".as_bytes(), "remind")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CarculatorError>(),
            Some(CarculatorError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_inverse_last_write_wins() {
        let mapping = "remind;Gas CC;SE|Electricity|Gas\nremind;Gas OC;SE|Electricity|Gas\n";
        let labels = ElectricityMarketLabels::from_reader(mapping.as_bytes(), "remind").unwrap();
        let inverse = labels.inverse();
        assert_eq!(inverse.len(), 1);
        assert_eq!(inverse["SE|Electricity|Gas"], "Gas OC");
    }

    #[test]
    #[cfg(feature = "resources")]
    fn test_packaged_labels() {
        let remind = ElectricityMarketLabels::load("remind").unwrap();
        assert_eq!(remind.get("Hydro"), Some("SE|Electricity|Hydro"));
        let image = ElectricityMarketLabels::load("image").unwrap();
        assert!(image.contains_market("Secondary Energy|Electricity|Nuclear"));
    }

    #[test]
    fn test_from_file_not_found() {
        let err = ElectricityMarketLabels::from_file("does/not/exist.csv", "remind").unwrap_err();
        assert_eq!(err.to_string(), "Could not locate does/not/exist.csv");
    }
}

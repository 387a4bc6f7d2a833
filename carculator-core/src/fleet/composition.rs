use super::{FleetArray, FleetConfig};
use crate::imports::*;

/// One row of an IAM fleet composition file
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct FleetRecord {
    #[serde(deserialize_with = "deserialize_year")]
    year: u32,
    #[serde(rename = "IAM_region")]
    iam_region: String,
    powertrain: String,
    size: String,
    #[serde(deserialize_with = "deserialize_year")]
    vintage_year: u32,
    /// vehicle-kilometers driven in `year` by vehicles built in `vintage_year`
    vintage_demand_vkm: Option<f64>,
}

/// Accepts `2020` as well as the `2020.0` pandas writes for integer columns holding gaps.
/// An empty cell is year 0, like any other missing value of the file.
fn deserialize_year<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    if label.trim().is_empty() {
        return Ok(0);
    }
    utils::parse_year(&label).map_err(serde::de::Error::custom)
}

type FleetKey = (String, String, String, u32, u32);

/// Vehicle-kilometer demand per IAM region, powertrain, size, vintage year and calendar year
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetComposition {
    pub regions: Vec<String>,
    pub powertrains: Vec<String>,
    pub sizes: Vec<String>,
    pub vintage_years: Vec<u32>,
    pub years: Vec<u32>,
    /// axes in the order of the label fields above
    pub vkm: Array5<f64>,
}

impl SerdeAPI for FleetComposition {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.vkm.dim()
                == (
                    self.regions.len(),
                    self.powertrains.len(),
                    self.sizes.len(),
                    self.vintage_years.len(),
                    self.years.len()
                ),
            "{}\nvkm does not match the axes",
            format_dbg!(self.vkm.dim())
        );
        Ok(())
    }
}

impl FleetComposition {
    /// Reads comma-delimited fleet composition data.
    ///
    /// Only the `year`, `IAM_region`, `powertrain`, `size`, `vintage_year` and
    /// `vintage_demand_vkm` columns are used. Rows sharing all five coordinates are summed,
    /// a missing demand or year counts as zero, and every combination of the coordinates found in the
    /// data is present in the result.
    pub fn from_reader<R: std::io::Read>(rdr: R, config: &FleetConfig) -> anyhow::Result<Self> {
        let mut rdr = csv::Reader::from_reader(rdr);
        let mut demand: HashMap<FleetKey, f64> = HashMap::new();
        for (i, record) in rdr.deserialize::<FleetRecord>().enumerate() {
            let record = record.with_context(|| format!("fleet composition row {}", i + 1))?;
            *demand
                .entry((
                    record.iam_region,
                    record.powertrain,
                    record.size,
                    record.vintage_year,
                    record.year,
                ))
                .or_default() += record.vintage_demand_vkm.unwrap_or_default();
        }
        log::debug!("Read {} fleet composition entries", demand.len());
        Ok(Self::from_demand(&demand, config))
    }

    /// Zero-filled cartesian product of the coordinates, overlaid with `demand`
    fn from_demand(demand: &HashMap<FleetKey, f64>, config: &FleetConfig) -> Self {
        let regions: Vec<String> = demand.keys().map(|k| k.0.clone()).sorted().dedup().collect();
        let powertrains: Vec<String> =
            demand.keys().map(|k| k.1.clone()).sorted().dedup().collect();
        let sizes: Vec<String> = demand.keys().map(|k| k.2.clone()).sorted().dedup().collect();
        let vintage_years: Vec<u32> = demand.keys().map(|k| k.3).sorted().dedup().collect();
        let years: Vec<u32> = demand.keys().map(|k| k.4).sorted().dedup().collect();

        let mut vkm = Array5::<f64>::zeros((
            regions.len(),
            powertrains.len(),
            sizes.len(),
            vintage_years.len(),
            years.len(),
        ));
        for ((region, powertrain, size, vintage_year, year), value) in demand {
            // axes were built from these keys, so every lookup succeeds
            let idx = [
                regions.binary_search(region),
                powertrains.binary_search(powertrain),
                sizes.binary_search(size),
                vintage_years.binary_search(vintage_year),
                years.binary_search(year),
            ];
            if let [Ok(a), Ok(b), Ok(c), Ok(d), Ok(e)] = idx {
                vkm[[a, b, c, d, e]] = *value;
            }
        }
        vkm.mapv_inplace(|v| round_to(v, config.decimals));

        Self {
            regions,
            powertrains,
            sizes,
            vintage_years,
            years,
            vkm,
        }
    }

    /// Value at the given coordinates, `None` if any coordinate is off its axis
    pub fn get(
        &self,
        region: &str,
        powertrain: &str,
        size: &str,
        vintage_year: u32,
        year: u32,
    ) -> Option<f64> {
        let a = self.regions.iter().position(|r| r == region)?;
        let b = self.powertrains.iter().position(|p| p == powertrain)?;
        let c = self.sizes.iter().position(|s| s == size)?;
        let d = self.vintage_years.iter().position(|v| *v == vintage_year)?;
        let e = self.years.iter().position(|y| *y == year)?;
        Some(self.vkm[[a, b, c, d, e]])
    }

    /// Fleet of a single IAM region
    pub fn region(&self, region: &str) -> Option<FleetArray> {
        let a = self.regions.iter().position(|r| r == region)?;
        Some(FleetArray {
            powertrains: self.powertrains.clone(),
            sizes: self.sizes.clone(),
            vintage_years: self.vintage_years.clone(),
            years: self.years.clone(),
            values: self.vkm.index_axis(Axis(0), a).to_owned(),
        })
    }
}

/// Builds a [`FleetComposition`] from the comma-delimited file at `filepath`, see
/// [`FleetComposition::from_reader`].
///
/// # Errors
///
/// [`CarculatorError::FileNotFound`] if `filepath` is not an existing file.
pub fn build_fleet_composition<P: AsRef<Path>>(
    filepath: P,
    config: &FleetConfig,
) -> anyhow::Result<FleetComposition> {
    let filepath = filepath.as_ref();
    utils::check_file(filepath)?;
    let file = File::open(filepath).with_context(|| format!("Could not open file: {filepath:?}"))?;
    FleetComposition::from_reader(file, config).with_context(|| format!("{filepath:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLEET: &str = "\
,year,IAM_region,powertrain,size,vintage_year,vintage_demand_vkm,fleet_share
0,2020,EUR,ICEV-d,Medium,2015,1000.12345,0.5
1,2020,EUR,BEV,Medium,2020,20.5,0.1
2,2030,EUR,BEV,Medium,2020,10.0,0.1
3,2030,EUR,BEV,Medium,2020,5.0004,0.1
4,2030,CHA,ICEV-d,Small,2030,,0.3
";

    fn composition() -> FleetComposition {
        FleetComposition::from_reader(FLEET.as_bytes(), &FleetConfig::default()).unwrap()
    }

    #[test]
    fn test_axes_are_sorted_unique_coordinates() {
        let fleet = composition();
        assert_eq!(fleet.regions, vec!["CHA", "EUR"]);
        assert_eq!(fleet.powertrains, vec!["BEV", "ICEV-d"]);
        assert_eq!(fleet.sizes, vec!["Medium", "Small"]);
        assert_eq!(fleet.vintage_years, vec![2015, 2020, 2030]);
        assert_eq!(fleet.years, vec![2020, 2030]);
        assert_eq!(fleet.vkm.dim(), (2, 2, 2, 3, 2));
    }

    #[test]
    fn test_values_are_summed_and_rounded() {
        let fleet = composition();
        assert_eq!(fleet.get("EUR", "ICEV-d", "Medium", 2015, 2020), Some(1000.123));
        assert_eq!(fleet.get("EUR", "BEV", "Medium", 2020, 2020), Some(20.5));
        assert_eq!(fleet.get("EUR", "BEV", "Medium", 2020, 2030), Some(15.0));
    }

    #[test]
    fn test_missing_combinations_are_zero() {
        let fleet = composition();
        assert_eq!(fleet.get("CHA", "ICEV-d", "Small", 2030, 2030), Some(0.0));
        assert_eq!(fleet.get("CHA", "BEV", "Medium", 2020, 2020), Some(0.0));
        assert_eq!(fleet.get("EUR", "ICEV-d", "Medium", 2015, 2030), Some(0.0));
        assert_eq!(fleet.get("EUR", "FCEV", "Medium", 2015, 2030), None);
    }

    #[test]
    fn test_region_slice() {
        let eur = composition().region("EUR").unwrap();
        assert_eq!(eur.values.dim(), (2, 2, 3, 2));
        assert_eq!(eur.get("BEV", "Medium", 2020, 2030), Some(15.0));
        assert!(composition().region("USA").is_none());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "year,IAM_region,powertrain,size\n2020,EUR,BEV,Small\n";
        assert!(FleetComposition::from_reader(csv.as_bytes(), &FleetConfig::default()).is_err());
    }

    #[test]
    fn test_float_formatted_years() {
        let csv = "year,IAM_region,powertrain,size,vintage_year,vintage_demand_vkm\n\
                   2020.0,EUR,BEV,Small,2019.0,1.0\n";
        let fleet = FleetComposition::from_reader(csv.as_bytes(), &FleetConfig::default()).unwrap();
        assert_eq!(fleet.vintage_years, vec![2019]);
    }

    #[test]
    fn test_empty_year_cells_are_zero() {
        let csv = "year,IAM_region,powertrain,size,vintage_year,vintage_demand_vkm\n\
                   2020,EUR,BEV,Small,,4.0\n\
                   ,EUR,BEV,Small,2020,2.0\n";
        let fleet = FleetComposition::from_reader(csv.as_bytes(), &FleetConfig::default()).unwrap();
        assert_eq!(fleet.vintage_years, vec![0, 2020]);
        assert_eq!(fleet.years, vec![0, 2020]);
        assert_eq!(fleet.get("EUR", "BEV", "Small", 0, 2020), Some(4.0));
        assert_eq!(fleet.get("EUR", "BEV", "Small", 2020, 0), Some(2.0));
    }

    #[test]
    fn test_file_not_found() {
        let err = build_fleet_composition("missing/fleet_composition.csv", &FleetConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not locate missing/fleet_composition.csv"
        );
    }
}

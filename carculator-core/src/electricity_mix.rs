//! Extraction of electricity generation mixes from integrated assessment model (IAM) output
//! tables.
//!
//! An IAM reports generation per region, market variable and year. Extraction keeps the
//! variables the [`ElectricityMarketLabels`] know about, collapses them onto the
//! [`TECHNOLOGIES`] axis and turns them into shares that sum to one for every requested year.

use crate::imports::*;
use crate::labels::ElectricityMarketLabels;
use calamine::{open_workbook_auto, Reader};

/// Technology axis of every [`ElectricityMix`], in axis order
pub const TECHNOLOGIES: [&str; 15] = [
    "Hydro",
    "Nuclear",
    "Gas",
    "Solar",
    "Wind",
    "Biomass",
    "Coal",
    "Oil",
    "Geothermal",
    "Waste",
    "Biogas CCS",
    "Biomass CCS",
    "Coal CCS",
    "Gas CCS",
    "Wood CCS",
];

/// REMIND technology label → technology category.
/// Labels absent here (or mapped to `""`) do not contribute to any category.
const REMIND_CATEGORIES: &[(&str, &str)] = &[
    ("Biomass IGCC CCS", "Biomass CCS"),
    ("Biomass IGCC", "Biomass"),
    ("Biomass CHP", "Biomass"),
    ("Coal IGCC", "Coal"),
    ("Coal IGCC CCS", "Coal CCS"),
    ("Coal PC", "Coal"),
    ("Coal PC CCS", "Coal CCS"),
    ("Coal CHP", "Coal"),
    ("Gas CCS", "Gas CCS"),
    ("Gas CC", "Gas"),
    ("Gas OC", "Gas"),
    ("Gas CHP", "Gas"),
    ("Hydrogen", "Hydrogen"),
    ("Oil ST", "Oil"),
    ("Nuclear", "Nuclear"),
    ("Geothermal", "Geothermal"),
    ("Hydro", "Hydro"),
    ("Solar CSP", "Solar"),
    ("Solar PV", "Solar"),
    ("Wind", "Wind"),
];

/// IMAGE technology label → technology category
const IMAGE_CATEGORIES: &[(&str, &str)] = &[
    ("Biomass CHP", "Biomass"),
    ("Biomass CHP CCS", "Biomass CCS"),
    ("Biomass IGCC CCS", "Biomass CCS"),
    ("Biomass IGCC", "Biomass"),
    ("Biomass ST", "Biomass"),
    ("Coal PC", "Coal"),
    ("Coal IGCC", "Coal"),
    ("Coal IGCC CCS", "Coal CCS"),
    ("Coal CHP", "Coal"),
    ("Coal CHP CCS", "Coal"),
    ("Gas OC", "Gas"),
    ("Gas CC", "Gas"),
    ("Gas CHP", "Gas"),
    ("Gas CC CCS", "Gas CCS"),
    ("Gas CHP CCS", "Gas CCS"),
    ("Geothermal", "Geothermal"),
    ("Hydro", "Hydro"),
    ("Nuclear", "Nuclear"),
    ("Oil CC CCS", "Coal CCS"),
    ("Oil CHP CCS", "Coal CCS"),
    ("Oil ST", "Oil"),
    ("Oil CC", "Oil"),
    ("Oil CHP", "Oil"),
    ("Solar CSP", "Solar"),
    ("Solar PV Centralized", "Solar"),
    ("Solar PV Residential", "Solar"),
    ("Wind Onshore", ""),
    ("Wind Offshore", "Wind"),
];

/// Integrated assessment models whose output tables can be read
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IamModel {
    /// semicolon-delimited CSV with `Region`, `Variable` and `Unit` columns
    Remind,
    /// spreadsheet whose columns 2, 3 and 4 hold region, variable and unit
    Image,
}

impl IamModel {
    /// Identifier used in the label mapping file
    pub fn id(&self) -> &'static str {
        match self {
            Self::Remind => "remind",
            Self::Image => "image",
        }
    }

    /// Technology label → technology category table of this model
    pub fn technology_categories(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Remind => REMIND_CATEGORIES,
            Self::Image => IMAGE_CATEGORIES,
        }
    }

    /// Category `technology` collapses onto, `None` when it is not part of any
    pub fn category(&self, technology: &str) -> Option<&'static str> {
        self.technology_categories()
            .iter()
            .find(|(t, _)| *t == technology)
            .map(|(_, c)| *c)
            .filter(|c| !c.is_empty())
    }

    /// Reads an output table of this model
    pub fn read_table<P: AsRef<Path>>(&self, filepath: P) -> anyhow::Result<IamTable> {
        match self {
            Self::Remind => IamTable::from_remind_file(filepath),
            Self::Image => IamTable::from_image_file(filepath),
        }
    }
}

impl FromStr for IamModel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remind" => Ok(Self::Remind),
            "image" => Ok(Self::Image),
            _ => Err(CarculatorError::UnknownModel(s.to_string()).into()),
        }
    }
}

impl fmt::Display for IamModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One row of an IAM output table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IamRow {
    pub region: String,
    pub variable: String,
    pub unit: String,
    /// values in the order of [`IamTable::years`]
    pub values: Vec<f64>,
}

/// IAM output table in long form: one row per region, variable and unit, one value per year
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IamTable {
    /// strictly ascending years
    pub years: Vec<u32>,
    pub rows: Vec<IamRow>,
}

/// Where the index columns of a raw table are found
#[derive(Clone, Copy)]
enum IndexColumns {
    /// looked up by header name
    Named,
    /// Model, Scenario, Region, Variable, Unit as the first five columns
    Positional,
}

const SKIPPED_COLUMNS: [&str; 2] = ["Model", "Scenario"];

impl IamTable {
    /// Reads a REMIND semicolon-delimited CSV file
    pub fn from_remind_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        utils::check_file(filepath)?;
        let file = File::open(filepath)
            .with_context(|| format!("Could not open file: {filepath:?}"))?;
        Self::from_remind_reader(file).with_context(|| format!("{filepath:?}"))
    }

    /// Reads REMIND semicolon-delimited CSV data
    pub fn from_remind_reader<R: std::io::Read>(rdr: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(rdr);
        let header: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let records = rdr
            .records()
            .map(|record| Ok(record?.iter().map(String::from).collect()))
            .collect::<anyhow::Result<Vec<Vec<String>>>>()?;
        Self::from_records(&header, records, IndexColumns::Named)
    }

    /// Reads the first worksheet of an IMAGE spreadsheet (xlsx, xls or ods)
    pub fn from_image_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        utils::check_file(filepath)?;
        let mut workbook = open_workbook_auto(filepath)
            .with_context(|| format!("Could not open workbook: {filepath:?}"))?;
        let range = workbook
            .worksheet_range_at(0)
            .with_context(|| format!("Workbook has no worksheet: {filepath:?}"))??;
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
        let header = rows.next().ok_or_else(|| {
            CarculatorError::MalformedTable(format!("worksheet of {filepath:?} is empty"))
        })?;
        Self::from_records(&header, rows.collect(), IndexColumns::Positional)
            .with_context(|| format!("{filepath:?}"))
    }

    fn from_records(
        header: &[String],
        records: Vec<Vec<String>>,
        index: IndexColumns,
    ) -> anyhow::Result<Self> {
        let (region_col, variable_col, unit_col) = match index {
            IndexColumns::Named => {
                let position = |name: &str| {
                    header.iter().position(|h| h.trim() == name).ok_or_else(|| {
                        CarculatorError::MalformedTable(format!("missing {name:?} column"))
                    })
                };
                (position("Region")?, position("Variable")?, position("Unit")?)
            }
            IndexColumns::Positional => {
                ensure!(
                    header.len() > 5,
                    CarculatorError::MalformedTable(format!(
                        "expected Model, Scenario, Region, Variable, Unit and year columns, found {header:?}"
                    ))
                );
                (2, 3, 4)
            }
        };

        let mut year_cols: Vec<(usize, u32)> = Vec::new();
        for (i, label) in header.iter().enumerate() {
            let label = label.trim();
            let is_index = [region_col, variable_col, unit_col].contains(&i)
                || matches!(index, IndexColumns::Positional if i < 2);
            if is_index || label.is_empty() || SKIPPED_COLUMNS.contains(&label) {
                continue;
            }
            year_cols.push((i, utils::parse_year(label)?));
        }
        ensure!(
            !year_cols.is_empty(),
            CarculatorError::MalformedTable("table has no year columns".into())
        );
        year_cols.sort_by_key(|(_, year)| *year);
        if let Some(w) = year_cols.windows(2).find(|w| w[0].1 == w[1].1) {
            bail!(CarculatorError::MalformedTable(format!(
                "year {} appears more than once",
                w[0].1
            )));
        }

        let field = |record: &[String], i: usize| record.get(i).cloned().unwrap_or_default();
        let rows = records
            .iter()
            .filter(|record| record.iter().any(|cell| !cell.trim().is_empty()))
            .map(|record| {
                Ok(IamRow {
                    region: field(record, region_col),
                    variable: field(record, variable_col),
                    unit: field(record, unit_col),
                    values: year_cols
                        .iter()
                        .map(|(i, _)| utils::parse_cell(record.get(*i).map_or("", |c| c.as_str())))
                        .collect::<anyhow::Result<Vec<f64>>>()?,
                })
            })
            .collect::<anyhow::Result<Vec<IamRow>>>()?;

        Ok(Self {
            years: year_cols.into_iter().map(|(_, year)| year).collect(),
            rows,
        })
    }

    /// Distinct regions, in order of first appearance
    pub fn regions(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.region.clone()).unique().collect()
    }
}

/// Settings of electricity mix extraction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectricityMixConfig {
    /// Source years after this one are ignored
    pub max_source_year: u32,
    /// Behavior for target years outside the source years
    pub extrapolate: Extrapolate,
}

impl Default for ElectricityMixConfig {
    fn default() -> Self {
        Self {
            max_source_year: 2050,
            extrapolate: Extrapolate::Yes,
        }
    }
}

impl SerdeAPI for ElectricityMixConfig {}

/// Electricity generation shares per technology and year
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectricityMix {
    /// always [`TECHNOLOGIES`]
    pub technologies: Vec<String>,
    pub years: Vec<u32>,
    /// shares, axis 0 is technology and axis 1 is year
    pub shares: Array2<f64>,
}

impl SerdeAPI for ElectricityMix {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.shares.dim() == (self.technologies.len(), self.years.len()),
            "{}\nshares do not match technology and year axes",
            format_dbg!(self.shares.dim())
        );
        Ok(())
    }
}

impl ElectricityMix {
    /// Shares of all technologies in `year`
    pub fn shares_for_year(&self, year: u32) -> Option<ArrayView1<f64>> {
        let j = self.years.iter().position(|y| *y == year)?;
        Some(self.shares.column(j))
    }

    /// Share of `technology` in `year`
    pub fn share(&self, technology: &str, year: u32) -> Option<f64> {
        let i = self.technologies.iter().position(|t| t == technology)?;
        let j = self.years.iter().position(|y| *y == year)?;
        Some(self.shares[[i, j]])
    }
}

/// Extracts electricity mixes of one IAM
#[derive(Clone, Debug, PartialEq)]
pub struct ElectricityMixExtractor {
    pub model: IamModel,
    labels: ElectricityMarketLabels,
    /// market variable → technology label
    markets: HashMap<String, String>,
    pub config: ElectricityMixConfig,
}

impl ElectricityMixExtractor {
    /// Fails when `labels` holds nothing, which is what an unknown model id loads to
    pub fn new(
        model: IamModel,
        labels: ElectricityMarketLabels,
        config: ElectricityMixConfig,
    ) -> anyhow::Result<Self> {
        ensure!(
            !labels.is_empty(),
            CarculatorError::UnknownModel(labels.model.clone())
        );
        if labels.model != model.id() {
            log::warn!(
                "Labels were loaded for {:?} but are used with {model}",
                labels.model
            );
        }
        let markets = labels.inverse();
        Ok(Self {
            model,
            labels,
            markets,
            config,
        })
    }

    /// Builds an extractor for `model` with the packaged label mapping
    #[cfg(feature = "resources")]
    pub fn from_model(model: &str, config: ElectricityMixConfig) -> anyhow::Result<Self> {
        let iam = IamModel::from_str(model)?;
        Self::new(iam, ElectricityMarketLabels::load(iam.id())?, config)
    }

    pub fn labels(&self) -> &ElectricityMarketLabels {
        &self.labels
    }

    /// Reads the table at `filepath` and extracts the mix of `region` for `years`
    pub fn extract<P: AsRef<Path>>(
        &self,
        filepath: P,
        region: &str,
        years: &[u32],
    ) -> anyhow::Result<ElectricityMix> {
        let table = self.model.read_table(filepath)?;
        self.extract_from_table(&table, region, years)
    }

    /// Extracts the mix of `region` for `years` from an already read table
    pub fn extract_from_table(
        &self,
        table: &IamTable,
        region: &str,
        years: &[u32],
    ) -> anyhow::Result<ElectricityMix> {
        ensure!(!years.is_empty(), "At least one target year is required");
        ensure!(
            table.years.windows(2).all(|w| w[0] < w[1]),
            CarculatorError::MalformedTable(format!(
                "table years {:?} are not strictly ascending",
                table.years
            ))
        );
        if let Some(row) = table
            .rows
            .iter()
            .find(|row| row.values.len() != table.years.len())
        {
            bail!(CarculatorError::MalformedTable(format!(
                "{:?} of {:?} has {} values for {} years",
                row.variable,
                row.region,
                row.values.len(),
                table.years.len()
            )));
        }

        let region_rows: Vec<&IamRow> = table.rows.iter().filter(|r| r.region == region).collect();
        if region_rows.is_empty() {
            bail!(CarculatorError::RegionNotFound {
                region: region.to_string(),
                available: table.regions(),
            });
        }

        let source_cols: Vec<usize> = table
            .years
            .iter()
            .positions(|year| *year <= self.config.max_source_year)
            .collect();
        let source_years: Vec<u32> = source_cols.iter().map(|&i| table.years[i]).collect();
        ensure!(
            source_years.len() >= 2,
            CarculatorError::MalformedTable(format!(
                "at least two years up to {} are needed, found {source_years:?}",
                self.config.max_source_year
            ))
        );

        // rows of known markets, renamed to their technology label
        let generation: Vec<(&str, Vec<f64>)> = region_rows
            .iter()
            .filter_map(|row| {
                self.markets.get(&row.variable).map(|technology| {
                    let values = source_cols.iter().map(|&i| row.values[i]).collect();
                    (technology.as_str(), values)
                })
            })
            .collect();
        ensure!(
            !generation.is_empty(),
            CarculatorError::MalformedTable(format!(
                "no {} electricity market found for region {region:?}",
                self.model
            ))
        );
        log::debug!(
            "{} of {} rows of {region:?} are {} electricity markets",
            generation.len(),
            region_rows.len(),
            self.model
        );

        let mut totals = vec![0.0; source_years.len()];
        for (_, values) in &generation {
            totals.iter_mut().zip(values).for_each(|(t, v)| *t += v);
        }
        let x: Vec<f64> = source_years.iter().map(|&y| y as f64).collect();
        // a source year without generation only matters to target years interpolated from it
        for &year in years {
            let i = utils::segment(year as f64, &x);
            if let Some(j) = [i, i + 1].into_iter().find(|&j| totals[j] == 0.0) {
                bail!(CarculatorError::ZeroTotal {
                    year: source_years[j]
                });
            }
        }

        let mut source = Array2::<f64>::zeros((TECHNOLOGIES.len(), source_years.len()));
        for (technology, values) in &generation {
            let Some(k) = self
                .model
                .category(technology)
                .and_then(|c| TECHNOLOGIES.iter().position(|t| *t == c))
            else {
                log::debug!("{technology:?} does not contribute to any technology category");
                continue;
            };
            for (j, value) in values.iter().enumerate() {
                if totals[j] != 0.0 {
                    source[[k, j]] += value / totals[j];
                }
            }
        }

        let mut shares = Array2::<f64>::zeros((TECHNOLOGIES.len(), years.len()));
        for (k, row) in source.outer_iter().enumerate() {
            let y = row.to_vec();
            for (j, &year) in years.iter().enumerate() {
                shares[[k, j]] =
                    interp1d(&(year as f64), &x, &y, self.config.extrapolate)?.clamp(0.0, 1.0);
            }
        }
        for (j, mut column) in shares.axis_iter_mut(Axis(1)).enumerate() {
            let total = column.sum();
            if total <= 0.0 {
                bail!(CarculatorError::ZeroTotal { year: years[j] });
            }
            column /= total;
        }

        Ok(ElectricityMix {
            technologies: TECHNOLOGIES.iter().map(|t| t.to_string()).collect(),
            years: years.to_vec(),
            shares,
        })
    }
}

/// Extracts the electricity mix of `region` for `years` from the `model` output table at
/// `filepath`, using the packaged label mapping.
///
/// # Arguments
///
/// * `model` - IAM identifier, `remind` or `image`
/// * `filepath` - IAM output table
/// * `region` - IAM region, e.g. `EUR`
/// * `years` - years to return shares for, extrapolated outside the source years
/// * `config` - extraction settings
#[cfg(feature = "resources")]
pub fn extract_electricity_mix<P: AsRef<Path>>(
    model: &str,
    filepath: P,
    region: &str,
    years: &[u32],
    config: ElectricityMixConfig,
) -> anyhow::Result<ElectricityMix> {
    ElectricityMixExtractor::from_model(model, config)?.extract(filepath, region, years)
}

/// Like [`extract_electricity_mix`] but with the label mapping read from `labels_path`
pub fn extract_electricity_mix_with_labels<P: AsRef<Path>, Q: AsRef<Path>>(
    model: &str,
    labels_path: Q,
    filepath: P,
    region: &str,
    years: &[u32],
    config: ElectricityMixConfig,
) -> anyhow::Result<ElectricityMix> {
    let iam = IamModel::from_str(model)?;
    let labels = ElectricityMarketLabels::from_file(labels_path, iam.id())?;
    ElectricityMixExtractor::new(iam, labels, config)?.extract(filepath, region, years)
}

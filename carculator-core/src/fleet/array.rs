use crate::imports::*;
use crate::scope::Scope;

/// Dense fleet array, axes are powertrain, size, vintage year and calendar year
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetArray {
    pub powertrains: Vec<String>,
    pub sizes: Vec<String>,
    pub vintage_years: Vec<u32>,
    pub years: Vec<u32>,
    pub values: Array4<f64>,
}

impl SerdeAPI for FleetArray {
    fn init(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.values.dim()
                == (
                    self.powertrains.len(),
                    self.sizes.len(),
                    self.vintage_years.len(),
                    self.years.len()
                ),
            "{}\nvalues do not match the axes",
            format_dbg!(self.values.dim())
        );
        Ok(())
    }
}

impl FleetArray {
    /// Value at the given coordinates, `None` if any coordinate is off its axis
    pub fn get(&self, powertrain: &str, size: &str, vintage_year: u32, year: u32) -> Option<f64> {
        let i = self.powertrains.iter().position(|p| p == powertrain)?;
        let j = self.sizes.iter().position(|s| s == size)?;
        let k = self.vintage_years.iter().position(|v| *v == vintage_year)?;
        let l = self.years.iter().position(|y| *y == year)?;
        Some(self.values[[i, j, k, l]])
    }

    /// Reads a semicolon-delimited fleet array and checks it against `scope`.
    ///
    /// The first three columns hold powertrain, size and vintage year, the remaining ones are
    /// calendar years. Years of `scope` missing from the file and powertrain/size/vintage
    /// combinations missing from the file are zero in the result.
    ///
    /// # Errors
    ///
    /// [`CarculatorError::ScopeMismatch`] when
    /// - a calendar year is not in `scope.year`
    /// - the vintage years of the file are not exactly `scope.year`
    /// - a powertrain is not in `scope.powertrain`
    /// - a size is not in `scope.size`
    pub fn from_reader<R: std::io::Read>(rdr: R, scope: &Scope) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .flexible(true)
            .from_reader(rdr);

        let header = rdr.headers()?.clone();
        ensure!(
            header.len() >= 3,
            CarculatorError::MalformedTable(
                "fleet array needs powertrain, size and vintage year columns".into()
            )
        );
        let year_cols: Vec<(usize, u32)> = header
            .iter()
            .enumerate()
            .skip(3)
            .filter(|(_, label)| !label.trim().is_empty())
            .map(|(i, label)| Ok((i, utils::parse_year(label)?)))
            .collect::<anyhow::Result<_>>()?;
        let years: Vec<u32> = year_cols.iter().map(|(_, y)| *y).collect();
        ensure!(
            years.iter().all_unique(),
            CarculatorError::MalformedTable(format!("duplicated year columns in {years:?}"))
        );

        let mut entries: HashMap<(String, String, u32), Vec<f64>> = HashMap::new();
        let mut powertrains: BTreeSet<String> = BTreeSet::new();
        let mut sizes: BTreeSet<String> = BTreeSet::new();
        let mut vintage_years: BTreeSet<u32> = BTreeSet::new();
        for record in rdr.records() {
            let record = record?;
            let powertrain = record.get(0).unwrap_or_default().trim().to_string();
            let size = record.get(1).unwrap_or_default().trim().to_string();
            let vintage_year = utils::parse_year(record.get(2).unwrap_or_default())?;
            let values = year_cols
                .iter()
                .map(|(i, _)| utils::parse_cell(record.get(*i).unwrap_or_default()))
                .collect::<anyhow::Result<Vec<f64>>>()?;
            powertrains.insert(powertrain.clone());
            sizes.insert(size.clone());
            vintage_years.insert(vintage_year);
            let key = (powertrain, size, vintage_year);
            ensure!(
                !entries.contains_key(&key),
                CarculatorError::MalformedTable(format!("duplicated fleet array row {key:?}"))
            );
            entries.insert(key, values);
        }
        log::debug!("Read {} fleet array rows", entries.len());

        if !years.iter().all(|y| scope.year.contains(y)) {
            bail!(CarculatorError::scope_mismatch("year", &scope.year));
        }
        let scope_years: BTreeSet<u32> = scope.year.iter().copied().collect();
        if vintage_years != scope_years {
            bail!(CarculatorError::scope_mismatch("vintage year", &scope.year));
        }
        if !powertrains.iter().all(|p| scope.powertrain.contains(p)) {
            bail!(CarculatorError::scope_mismatch("powertrain", &scope.powertrain));
        }
        if !sizes.iter().all(|s| scope.size.contains(s)) {
            bail!(CarculatorError::scope_mismatch("size", &scope.size));
        }

        // every coordinate is in scope now, so the scope domains are the axes
        let n_years = scope.year.len();
        let mut values = Array4::<f64>::zeros((
            scope.powertrain.len(),
            scope.size.len(),
            n_years,
            n_years,
        ));
        let year_index: HashMap<u32, usize> =
            scope.year.iter().enumerate().map(|(i, y)| (*y, i)).collect();
        for ((powertrain, size, vintage_year), row) in &entries {
            let i = scope.powertrain.iter().position(|p| p == powertrain);
            let j = scope.size.iter().position(|s| s == size);
            let (Some(i), Some(j)) = (i, j) else {
                bail!("{}\nfleet coordinate outside scope", format_dbg!((powertrain, size)));
            };
            let k = year_index[vintage_year];
            for (year, value) in years.iter().zip(row) {
                values[[i, j, k, year_index[year]]] = *value;
            }
        }

        Ok(Self {
            powertrains: scope.powertrain.clone(),
            sizes: scope.size.clone(),
            vintage_years: scope.year.clone(),
            years: scope.year.clone(),
            values,
        })
    }
}

/// Reads the fleet array at `filepath` and validates it against `scope`, see
/// [`FleetArray::from_reader`].
pub fn build_fleet_array<P: AsRef<Path>>(filepath: P, scope: &Scope) -> anyhow::Result<FleetArray> {
    let filepath = filepath.as_ref();
    utils::check_file(filepath)?;
    let file = File::open(filepath).with_context(|| format!("Could not open file: {filepath:?}"))?;
    FleetArray::from_reader(file, scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new(vec![2020, 2030], vec!["ICEV", "BEV"], vec!["small"]).unwrap()
    }

    fn mismatch_domain(err: &anyhow::Error) -> String {
        match err.downcast_ref::<CarculatorError>() {
            Some(CarculatorError::ScopeMismatch { domain, .. }) => domain.clone(),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_compliant_array_is_densified() {
        let csv = "\
powertrain;size;vintage_year;2020;2030
ICEV;small;2020;0.8;0.5
BEV;small;2030;;0.25
";
        let arr = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap();
        assert_eq!(arr.values.dim(), (2, 1, 2, 2));
        assert_eq!(arr.powertrains, vec!["ICEV", "BEV"]);
        assert_eq!(arr.get("ICEV", "small", 2020, 2020), Some(0.8));
        assert_eq!(arr.get("ICEV", "small", 2020, 2030), Some(0.5));
        assert_eq!(arr.get("BEV", "small", 2030, 2030), Some(0.25));
        assert_eq!(arr.get("BEV", "small", 2030, 2020), Some(0.0));
        // combinations absent from the file
        assert_eq!(arr.get("ICEV", "small", 2030, 2030), Some(0.0));
        assert_eq!(arr.get("BEV", "small", 2020, 2020), Some(0.0));
        assert_eq!(arr.get("PHEV", "small", 2020, 2020), None);
    }

    #[test]
    fn test_missing_scope_years_are_added() {
        let csv = "\
powertrain;size;vintage_year;2020
ICEV;small;2020;1.0
ICEV;small;2030;0.0
";
        let arr = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap();
        assert_eq!(arr.years, vec![2020, 2030]);
        assert_eq!(arr.get("ICEV", "small", 2020, 2030), Some(0.0));
        assert_eq!(arr.values.sum(), 1.0);
    }

    #[test]
    fn test_missing_vintage_year_fails() {
        let csv = "\
powertrain;size;vintage_year;2020;2030
ICEV;small;2020;0.8;0.5
BEV;small;2020;0.2;0.5
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert_eq!(mismatch_domain(&err), "vintage year");
        assert_eq!(
            err.to_string(),
            "The fleet vintage year list differs from [2020, 2030]"
        );
    }

    #[test]
    fn test_extra_vintage_year_fails() {
        let csv = "\
powertrain;size;vintage_year;2020
ICEV;small;2020;1
ICEV;small;2030;1
ICEV;small;2040;1
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert_eq!(mismatch_domain(&err), "vintage year");
    }

    #[test]
    fn test_year_outside_scope_fails() {
        let csv = "\
powertrain;size;vintage_year;2020;2040
ICEV;small;2020;1;1
ICEV;small;2030;1;1
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert_eq!(mismatch_domain(&err), "year");
    }

    #[test]
    fn test_powertrain_outside_scope_fails() {
        let csv = "\
powertrain;size;vintage_year;2020
FCEV;small;2020;1
ICEV;small;2030;1
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert_eq!(mismatch_domain(&err), "powertrain");
    }

    #[test]
    fn test_size_outside_scope_fails() {
        let csv = "\
powertrain;size;vintage_year;2020
ICEV;large;2020;1
ICEV;small;2030;1
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert_eq!(mismatch_domain(&err), "size");
    }

    #[test]
    fn test_duplicated_row_fails() {
        let csv = "\
powertrain;size;vintage_year;2020
ICEV;small;2020;1
ICEV;small;2020;2
";
        let err = FleetArray::from_reader(csv.as_bytes(), &scope()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CarculatorError>(),
            Some(CarculatorError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_non_year_column_fails() {
        let csv = "powertrain;size;vintage_year;total\nICEV;small;2020;1\n";
        assert!(FleetArray::from_reader(csv.as_bytes(), &scope()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = build_fleet_array("no/such/fleet.csv", &scope()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CarculatorError>(),
            Some(&CarculatorError::FileNotFound("no/such/fleet.csv".into()))
        );
    }
}

use crate::imports::*;

/// Text formats configuration files and results are read from and written to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub const ACCEPTED: &'static [&'static str] = &["yaml", "yml", "json"];

    /// Format matching the extension of `filepath`
    pub fn from_path(filepath: &Path) -> anyhow::Result<Self> {
        filepath
            .extension()
            .and_then(OsStr::to_str)
            .with_context(|| format!("File extension could not be parsed: {filepath:?}"))?
            .parse()
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => bail!(
                "Unsupported format {s:?}, must be one of {:?}",
                Self::ACCEPTED
            ),
        }
    }
}

/// Serialization of labelled arrays, scopes and settings.
///
/// Every constructor goes through [`SerdeAPI::init`], so an implementor only has to validate
/// there.
pub trait SerdeAPI: Serialize + for<'a> Deserialize<'a> {
    /// Checks run after every deserialization
    fn init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Writes `self` to `filepath`, in the format given by its extension.
    /// The file is created or truncated.
    fn to_file<P: AsRef<Path>>(&self, filepath: P) -> anyhow::Result<()> {
        let filepath = filepath.as_ref();
        let format = Format::from_path(filepath)?;
        let file =
            File::create(filepath).with_context(|| format!("Could not create {filepath:?}"))?;
        self.to_writer(file, format)
    }

    fn to_writer<W: std::io::Write>(&self, wtr: W, format: Format) -> anyhow::Result<()> {
        match format {
            Format::Yaml => serde_yaml::to_writer(wtr, self)?,
            Format::Json => serde_json::to_writer(wtr, self)?,
        }
        Ok(())
    }

    /// Reads an object from `filepath`, in the format given by its extension
    ///
    /// # Errors
    ///
    /// [`CarculatorError::FileNotFound`] if `filepath` is not an existing file.
    fn from_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        utils::check_file(filepath)?;
        let format = Format::from_path(filepath)?;
        let file =
            File::open(filepath).with_context(|| format!("Could not open file: {filepath:?}"))?;
        Self::from_reader(file, format).with_context(|| format!("Could not deserialize {filepath:?}"))
    }

    /// Serializes into a string, `format` being `yaml` or `json`
    fn to_str(&self, format: &str) -> anyhow::Result<String> {
        match format.parse()? {
            Format::Yaml => self.to_yaml(),
            Format::Json => self.to_json(),
        }
    }

    /// Deserializes from a string, `format` being `yaml` or `json`
    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        match format.parse()? {
            Format::Yaml => Self::from_yaml(contents),
            Format::Json => Self::from_json(contents),
        }
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: Format) -> anyhow::Result<Self> {
        let mut deserialized: Self = match format {
            Format::Yaml => serde_yaml::from_reader(rdr)?,
            Format::Json => serde_json::from_reader(rdr)?,
        };
        deserialized.init()?;
        Ok(deserialized)
    }

    fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self)?)
    }

    fn from_json<S: AsRef<str>>(json_str: S) -> anyhow::Result<Self> {
        let mut json_de: Self = serde_json::from_str(json_str.as_ref())?;
        json_de.init()?;
        Ok(json_de)
    }

    fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(&self)?)
    }

    fn from_yaml<S: AsRef<str>>(yaml_str: S) -> anyhow::Result<Self> {
        let mut yaml_de: Self = serde_yaml::from_str(yaml_str.as_ref())?;
        yaml_de.init()?;
        Ok(yaml_de)
    }
}

/// Equality within a relative or absolute tolerance, see [`almost_eq`]
pub trait ApproxEq<Rhs = Self> {
    fn approx_eq(&self, other: &Rhs, tol: f64) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &f64, tol: f64) -> bool {
        almost_eq(*self, *other, Some(tol))
    }
}

impl<D: Dimension> ApproxEq for Array<f64, D> {
    fn approx_eq(&self, other: &Array<f64, D>, tol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .iter()
                .zip(other.iter())
                .all(|(x, y)| x.approx_eq(y, tol))
    }
}

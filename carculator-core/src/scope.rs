use crate::imports::*;

/// Authoritative domains a fleet array is validated against
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Calendar years, in the order the array axes should follow
    pub year: Vec<u32>,
    /// Powertrain labels, e.g. `ICEV-d`, `BEV`
    pub powertrain: Vec<String>,
    /// Size classes, e.g. `Small`, `Medium`
    pub size: Vec<String>,
}

impl SerdeAPI for Scope {
    fn init(&mut self) -> anyhow::Result<()> {
        self.check()
    }
}

impl Scope {
    pub fn new<S: Into<String>>(
        year: Vec<u32>,
        powertrain: Vec<S>,
        size: Vec<S>,
    ) -> anyhow::Result<Self> {
        let scope = Self {
            year,
            powertrain: powertrain.into_iter().map(Into::into).collect(),
            size: size.into_iter().map(Into::into).collect(),
        };
        scope.check()?;
        Ok(scope)
    }

    fn check(&self) -> anyhow::Result<()> {
        ensure!(!self.year.is_empty(), "Scope must declare at least one year");
        ensure!(
            !self.powertrain.is_empty(),
            "Scope must declare at least one powertrain"
        );
        ensure!(!self.size.is_empty(), "Scope must declare at least one size");
        ensure!(
            self.year.iter().all_unique(),
            "Scope years contain duplicates: {:?}",
            self.year
        );
        ensure!(
            self.powertrain.iter().all_unique(),
            "Scope powertrains contain duplicates: {:?}",
            self.powertrain
        );
        ensure!(
            self.size.iter().all_unique(),
            "Scope sizes contain duplicates: {:?}",
            self.size
        );
        Ok(())
    }
}

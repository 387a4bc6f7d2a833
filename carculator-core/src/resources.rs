use include_dir::{include_dir, Dir};
pub const RESOURCES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources");

/// File name of the default IAM electricity market label mapping
pub const ELECTRICITY_MARKETS_FILE: &str = "electricity_markets.csv";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping_is_packaged() {
        let file = RESOURCES_DIR.get_file(ELECTRICITY_MARKETS_FILE).unwrap();
        assert!(file.contents_utf8().unwrap().starts_with("remind;"));
    }
}

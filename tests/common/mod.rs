use sales_log::core::{Catalog, ConfigProvider};
use std::path::Path;

#[allow(dead_code)]
pub struct TestConfig {
    pub data_path: String,
    pub output_path: String,
    pub catalog: Catalog,
}

#[allow(dead_code)]
impl TestConfig {
    pub fn new(data_path: impl AsRef<Path>) -> Self {
        let data_path = data_path.as_ref();
        let output_path = data_path
            .parent()
            .map(|p| p.join("output"))
            .unwrap_or_else(|| Path::new("output").to_path_buf());
        Self {
            data_path: data_path.to_string_lossy().to_string(),
            output_path: output_path.to_string_lossy().to_string(),
            catalog: Catalog::default(),
        }
    }
}

impl ConfigProvider for TestConfig {
    fn data_path(&self) -> &str {
        &self.data_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn default_salesperson(&self) -> &str {
        "김범준"
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

//! Startup settings: command-line flags layered over environment variables.

use clap::Args;
use receta_core::config::{
    catalog_format_from_env_value, export_dir_from_env_value, export_format_from_env_value,
    language_from_env_value, path_from_env_value,
};
use receta_core::{CatalogLocation, CoreConfig};

pub const ENV_EXPORT_DIR: &str = "RECETA_EXPORT_DIR";
pub const ENV_LANGUAGE: &str = "RECETA_LANGUAGE";
pub const ENV_LABELS: &str = "RECETA_LABELS";
pub const ENV_FORMAT: &str = "RECETA_FORMAT";
pub const ENV_CATALOG: &str = "RECETA_CATALOG";
pub const ENV_CATALOG_FORMAT: &str = "RECETA_CATALOG_FORMAT";

#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Directory exported prescriptions are written to [env: RECETA_EXPORT_DIR] [default: exports]
    #[arg(long, global = true)]
    pub export_dir: Option<String>,
    /// Document language, `es` or `en` [env: RECETA_LANGUAGE] [default: es]
    #[arg(long, global = true)]
    pub language: Option<String>,
    /// YAML file with a custom language table [env: RECETA_LABELS]
    #[arg(long, global = true)]
    pub labels: Option<String>,
    /// Export format: pdf, md or txt [env: RECETA_FORMAT] [default: pdf]
    #[arg(long, global = true)]
    pub format: Option<String>,
    /// Product catalog file [env: RECETA_CATALOG]
    #[arg(long, global = true)]
    pub catalog: Option<String>,
    /// Catalog file format: yaml or sheet [env: RECETA_CATALOG_FORMAT]
    #[arg(long, global = true)]
    pub catalog_format: Option<String>,
}

impl SettingsArgs {
    /// Resolves the core configuration. Flags win over `env`; blank values mean unset.
    pub fn resolve(self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<CoreConfig> {
        let pick = |flag: Option<String>, key: &str| flag.or_else(|| env(key));

        let export_dir = export_dir_from_env_value(pick(self.export_dir, ENV_EXPORT_DIR));
        let language = language_from_env_value(pick(self.language, ENV_LANGUAGE))?;
        let labels = path_from_env_value(pick(self.labels, ENV_LABELS));
        let format = export_format_from_env_value(pick(self.format, ENV_FORMAT))?;
        let catalog_format =
            catalog_format_from_env_value(pick(self.catalog_format, ENV_CATALOG_FORMAT))?;
        let catalog = path_from_env_value(pick(self.catalog, ENV_CATALOG))
            .map(|path| CatalogLocation::new(path, catalog_format));

        Ok(CoreConfig::new(export_dir, language, labels, format, catalog)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use receta_core::{CatalogFormat, ExportFormat, Language};
    use std::collections::HashMap;
    use std::path::Path;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_flags_or_env() {
        let config = SettingsArgs::default().resolve(env_from(&[])).unwrap();

        assert_eq!(config.export_dir(), Path::new("exports"));
        assert_eq!(config.language(), Language::Es);
        assert_eq!(config.default_format(), ExportFormat::Pdf);
        assert!(config.catalog().is_none());
        assert!(config.labels_path().is_none());
    }

    #[test]
    fn test_env_values_are_used() {
        let env = env_from(&[
            (ENV_EXPORT_DIR, "/tmp/recetas"),
            (ENV_LANGUAGE, "en"),
            (ENV_FORMAT, "txt"),
            (ENV_CATALOG, "productos.yaml"),
        ]);
        let config = SettingsArgs::default().resolve(env).unwrap();

        assert_eq!(config.export_dir(), Path::new("/tmp/recetas"));
        assert_eq!(config.language(), Language::En);
        assert_eq!(config.default_format(), ExportFormat::Text);
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.path, Path::new("productos.yaml"));
        assert_eq!(catalog.format, CatalogFormat::Yaml);
    }

    #[test]
    fn test_flags_override_env() {
        let env = env_from(&[
            (ENV_LANGUAGE, "en"),
            (ENV_FORMAT, "txt"),
            (ENV_CATALOG, "productos.yaml"),
        ]);
        let args = SettingsArgs {
            language: Some("es".into()),
            format: Some("md".into()),
            catalog_format: Some("sheet".into()),
            ..SettingsArgs::default()
        };
        let config = args.resolve(env).unwrap();

        assert_eq!(config.language(), Language::Es);
        assert_eq!(config.default_format(), ExportFormat::Markdown);
        assert_eq!(config.catalog().unwrap().format, CatalogFormat::Sheet);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = SettingsArgs::default()
            .resolve(env_from(&[(ENV_FORMAT, "docx")]))
            .unwrap_err();
        assert!(err.to_string().contains("docx"));
    }
}

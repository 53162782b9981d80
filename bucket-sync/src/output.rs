//! Output naming and formatting for the `keys` command.
//!
//! The five credential values are written to stdout under configurable names;
//! diagnostics go to stderr through `tracing`.

use anyhow::{bail, Context, Result};
use bucket_sync_core::credentials::ProjectCredentials;
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `KEY="value"` lines, as accepted by dotenv loaders
    #[default]
    Env,
    Json,
    Yaml,
    Toml,
    /// Aligned two-column table for humans
    Pretty,
}

/// Output keys for each credential. Override with `db.host=CUSTOM_NAME` style pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub db_host: String,
    pub db_password: String,
    pub jwt_secret: String,
    pub anon_key: String,
    pub service_role_key: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            db_host: "NEXT_PUBLIC_SUPABASE_URL".to_string(),
            db_password: "SUPABASE_DB_PASSWORD".to_string(),
            jwt_secret: "SUPABASE_AUTH_JWT_SECRET".to_string(),
            anon_key: "SUPABASE_AUTH_ANON_KEY".to_string(),
            service_role_key: "SUPABASE_AUTH_SERVICE_ROLE_KEY".to_string(),
        }
    }
}

impl OutputNames {
    /// Applies `key=NAME` overrides. Keys: `db.host`, `db.password`,
    /// `auth.jwt_secret`, `auth.anon_key`, `auth.service_role_key`.
    pub fn with_overrides<S: AsRef<str>>(mut self, overrides: &[S]) -> Result<Self> {
        for raw in overrides {
            let raw = raw.as_ref();
            let (key, name) = raw
                .split_once('=')
                .with_context(|| format!("Invalid override {raw:?}, expected KEY=NAME"))?;
            let name = name.trim();
            if name.is_empty() {
                bail!("Override for {key:?} has an empty name");
            }
            let slot = match key.trim() {
                "db.host" => &mut self.db_host,
                "db.password" => &mut self.db_password,
                "auth.jwt_secret" => &mut self.jwt_secret,
                "auth.anon_key" => &mut self.anon_key,
                "auth.service_role_key" => &mut self.service_role_key,
                other => bail!("Unknown override key {other:?}"),
            };
            *slot = name.to_string();
        }
        Ok(self)
    }

    /// Name → value mapping of exactly five entries.
    pub fn entries(&self, creds: &ProjectCredentials) -> Result<BTreeMap<String, String>> {
        let pairs = [
            (&self.db_host, &creds.db_host),
            (&self.db_password, &creds.db_password),
            (&self.jwt_secret, &creds.jwt_secret),
            (&self.anon_key, &creds.anon_key),
            (&self.service_role_key, &creds.service_role_key),
        ];
        let mut entries = BTreeMap::new();
        for (name, value) in pairs {
            if entries.insert(name.clone(), value.clone()).is_some() {
                bail!("Output name {name:?} is used for more than one value");
            }
        }
        Ok(entries)
    }
}

fn escape_env(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Writes `values` to `writer` in the selected format.
pub fn encode_output<W: Write>(
    format: OutputFormat,
    writer: &mut W,
    values: &BTreeMap<String, String>,
) -> Result<()> {
    match format {
        OutputFormat::Env => {
            for (key, value) in values {
                writeln!(writer, "{key}=\"{}\"", escape_env(value))?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, values)?;
            writeln!(writer)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut *writer, values)?;
        }
        OutputFormat::Toml => {
            let rendered = toml::to_string(values)?;
            writer.write_all(rendered.as_bytes())?;
        }
        OutputFormat::Pretty => {
            let width = values.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in values {
                writeln!(writer, "{key:<width$}  {value}")?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

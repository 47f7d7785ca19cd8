//! Loading the read-only inputs of a run: tunables, schema tables and PHI
//! policy, plus the snapshot that pins them.

use crate::accumulate::AccumulateContext;
use crate::logging::{event_names, Stage};
use hp_common::{Error, Result};
use hp_config::{
    resolve_config, validate_profiler_config, ConfigPaths, ConfigSnapshot, ProfilerConfig,
    SchemaTables,
};
use hp_redact::{PhiClassifier, PhiPolicy};
use std::path::Path;

/// Everything a run reads but never mutates.
pub struct ProfilerContext {
    pub paths: ConfigPaths,
    pub config: ProfilerConfig,
    pub tables: SchemaTables,
    pub phi: PhiClassifier,
    pub snapshot: ConfigSnapshot,
}

impl ProfilerContext {
    /// Resolve paths (CLI → env → XDG → built-in) and load.
    pub fn resolve(
        config: Option<&Path>,
        schema_dir: Option<&Path>,
        phi_policy: Option<&Path>,
        overrides: impl FnOnce(&mut ProfilerConfig),
    ) -> Result<Self> {
        Self::load(resolve_config(config, schema_dir, phi_policy), overrides)
    }

    /// Load from already resolved paths. `overrides` applies CLI flags on
    /// top of the file before validation.
    pub fn load(paths: ConfigPaths, overrides: impl FnOnce(&mut ProfilerConfig)) -> Result<Self> {
        let result = Self::load_inner(paths, overrides);
        if let Err(e) = &result {
            tracing::error!(
                event = event_names::CONFIG_INVALID,
                stage = %Stage::Init,
                code = e.code(),
                error = %e,
                "configuration rejected"
            );
        }
        result
    }

    fn load_inner(
        paths: ConfigPaths,
        overrides: impl FnOnce(&mut ProfilerConfig),
    ) -> Result<Self> {
        let mut config = match &paths.config {
            Some(path) => {
                ProfilerConfig::from_file(path).map_err(|e| Error::Config(e.to_string()))?
            }
            None => ProfilerConfig::default(),
        };
        overrides(&mut config);
        validate_profiler_config(&config).map_err(|e| Error::Config(e.to_string()))?;

        let tables = match &paths.schema_dir {
            Some(dir) => {
                SchemaTables::load_dir(dir).map_err(|e| Error::InvalidSchema(e.to_string()))?
            }
            None => SchemaTables::builtin(),
        };

        let policy = match &paths.phi_policy {
            Some(path) => {
                PhiPolicy::load(path).map_err(|e| Error::InvalidPhiPolicy(e.to_string()))?
            }
            None => PhiPolicy::default(),
        };
        let phi = PhiClassifier::new(&policy).map_err(|e| Error::InvalidPhiPolicy(e.to_string()))?;

        let snapshot =
            ConfigSnapshot::new(&config, tables.fingerprint(), phi.fingerprint(), &paths);
        tracing::info!(
            event = event_names::CONFIG_LOADED,
            stage = %Stage::Init,
            config_source = %paths.config_source,
            schema_source = %paths.schema_source,
            phi_policy_source = %paths.phi_policy_source,
            hash = snapshot.short_id(),
            "configuration loaded"
        );

        Ok(ProfilerContext {
            paths,
            config,
            tables,
            phi,
            snapshot,
        })
    }

    pub fn accumulate_context(&self) -> AccumulateContext<'_> {
        AccumulateContext {
            tables: &self.tables,
            phi: &self.phi,
            unique_value_cap: self.config.unique_value_cap,
        }
    }
}

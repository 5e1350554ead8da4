use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use envinjector_core::catalog::Requirement;
use envinjector_core::encode::PatchFormat;
use envinjector_core::model::TargetResource;

/// Hook options. The environment variable names for the two paths are the
/// ones shell-operator sets for every hook run.
#[derive(Parser, Debug, Clone)]
pub struct Options {
    /// Binding context written by shell-operator, or `-` for stdin
    #[arg(long, env = "BINDING_CONTEXT_PATH", value_name = "PATH")]
    pub binding_context_path: Option<PathBuf>,

    /// Where to write the patch document, or `-` for stdout
    #[arg(long, env = "KUBERNETES_PATCH_PATH", value_name = "PATH")]
    pub k8s_patch_path: Option<PathBuf>,

    /// Overwrite existing environment variables
    #[arg(long, env = "ENVINJECTOR_OVERWRITE")]
    pub overwrite: bool,

    /// A variable every container must have. May be repeated; takes
    /// precedence over `--catalog`
    #[arg(long = "env", short = 'e', value_name = "NAME=VALUE")]
    pub env: Vec<Requirement>,

    /// JSON file with required variables, either `{"NAME": "value"}` or
    /// `[{"name": "NAME", "value": "value"}]`
    #[arg(long, env = "ENVINJECTOR_CATALOG", value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// apiVersion of the watched resource
    #[arg(long, env = "ENVINJECTOR_API_VERSION", default_value = "v1")]
    pub api_version: String,

    /// kind of the watched resource
    #[arg(long, env = "ENVINJECTOR_KIND", default_value = "Pod")]
    pub kind: String,

    /// Dot-separated field path of the container list in the watched resource
    #[arg(
        long,
        env = "ENVINJECTOR_CONTAINERS_PATH",
        default_value = "spec.containers",
        value_name = "FIELD_PATH"
    )]
    pub containers_path: FieldPath,

    /// Name of the kubernetes binding in the hook configuration
    #[arg(long, default_value = "envinjector")]
    pub binding_name: String,

    /// Patch language of the emitted operations
    #[arg(long, env = "ENVINJECTOR_PATCH_FORMAT", value_enum, default_value_t = Format::Jq)]
    pub patch_format: Format,

    /// Log at debug level
    #[arg(long, env = "ENVINJECTOR_DEBUG")]
    pub debug: bool,

    /// Log file, or `-` for stderr
    #[arg(
        long,
        env = "ENVINJECTOR_LOG_FILE",
        default_value = "/var/log/envinjector",
        value_name = "PATH"
    )]
    pub log_file: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `JQPatch` operations
    Jq,
    /// `JSONPatch` operations (RFC 6902)
    JsonPatch,
}

impl From<Format> for PatchFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Jq => PatchFormat::Jq,
            Format::JsonPatch => PatchFormat::JsonPatch,
        }
    }
}

/// A dot-separated field path such as `spec.template.spec.containers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(pub Vec<String>);

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(format!("empty segment in field path {:?}", s));
        }
        Ok(FieldPath(segments))
    }
}

impl Options {
    pub fn target(&self) -> TargetResource {
        TargetResource {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            containers_path: self.containers_path.0.clone(),
        }
    }
}

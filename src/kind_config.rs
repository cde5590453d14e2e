//! Rendering of the kind cluster configuration.
//!
//! The configuration declares a single control-plane node labelled for
//! ingress and exposes the requested container ports on the host. Mappings
//! are rendered in container port order so the file is stable between runs.

use std::collections::BTreeMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

const HEADER: &str = concat!(
    "kind: Cluster\n",
    "apiVersion: kind.x-k8s.io/v1alpha4\n",
    "nodes:\n",
    "- role: control-plane\n",
    "  kubeadmConfigPatches:\n",
    "  - |\n",
    "    kind: InitConfiguration\n",
    "    nodeRegistration:\n",
    "      kubeletExtraArgs:\n",
    "        node-labels: \"ingress-ready=true\"\n",
);

/// Errors raised while parsing port mappings or writing the configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum KindConfigError {
    /// Raised when a mapping is not `containerPort=hostPort`.
    #[error("invalid port mapping {mapping:?}: expected containerPort=hostPort")]
    InvalidMapping {
        /// The mapping as supplied.
        mapping: String,
    },
    /// Raised when a port is not a number in 1-65535.
    #[error("invalid port {port:?} in mapping {mapping:?}")]
    InvalidPort {
        /// The mapping as supplied.
        mapping: String,
        /// The offending port text.
        port: String,
    },
    /// Raised when the configuration file cannot be written.
    #[error("failed to write {path}: {message}")]
    Io {
        /// Path that could not be written.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// One `containerPort=hostPort` pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortMapping {
    /// Port inside the node container.
    pub container_port: u16,
    /// Port on the host.
    pub host_port: u16,
}

impl FromStr for PortMapping {
    type Err = KindConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((container, host)) = s.split_once('=') else {
            return Err(KindConfigError::InvalidMapping {
                mapping: s.to_owned(),
            });
        };
        Ok(Self {
            container_port: parse_port(s, container)?,
            host_port: parse_port(s, host)?,
        })
    }
}

fn parse_port(mapping: &str, raw: &str) -> Result<u16, KindConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(KindConfigError::InvalidPort {
            mapping: mapping.to_owned(),
            port: raw.to_owned(),
        }),
    }
}

/// Container-to-host port mappings, keyed by container port.
///
/// A later mapping for the same container port replaces an earlier one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PortMappings(BTreeMap<u16, u16>);

impl PortMappings {
    /// Creates an empty mapping table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a mapping.
    pub fn insert(&mut self, mapping: PortMapping) {
        self.0.insert(mapping.container_port, mapping.host_port);
    }

    /// Number of mapped container ports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mappings in container port order.
    pub fn iter(&self) -> impl Iterator<Item = PortMapping> + '_ {
        self.0
            .iter()
            .map(|(&container_port, &host_port)| PortMapping {
                container_port,
                host_port,
            })
    }

    /// Parses each `containerPort=hostPort` entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`KindConfigError`] encountered.
    pub fn parse_all<I, S>(entries: I) -> Result<Self, KindConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mappings = Self::new();
        for entry in entries {
            mappings.insert(entry.as_ref().parse()?);
        }
        Ok(mappings)
    }
}

impl FromIterator<PortMapping> for PortMappings {
    fn from_iter<T: IntoIterator<Item = PortMapping>>(iter: T) -> Self {
        let mut mappings = Self::new();
        for mapping in iter {
            mappings.insert(mapping);
        }
        mappings
    }
}

/// Renders the kind cluster configuration document.
#[must_use]
pub fn render(mappings: &PortMappings) -> String {
    let mut rendered = String::from(HEADER);
    if mappings.is_empty() {
        rendered.push_str("  extraPortMappings: []\n");
        return rendered;
    }

    rendered.push_str("  extraPortMappings:\n");
    for mapping in mappings.iter() {
        rendered.push_str(&format!(
            "  - containerPort: {}\n    hostPort: {}\n    protocol: TCP\n",
            mapping.container_port, mapping.host_port
        ));
    }
    rendered
}

/// Renders the configuration and writes it to `path`, replacing any
/// existing file.
///
/// # Errors
///
/// Returns [`KindConfigError::Io`] when the parent directory cannot be
/// created or the file cannot be written.
pub fn write(path: &Utf8Path, mappings: &PortMappings) -> Result<(), KindConfigError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| KindConfigError::Io {
        path: path.to_path_buf(),
        message: String::from("configuration path is missing a filename"),
    })?;

    Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|err| {
        KindConfigError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| KindConfigError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;

    dir.write(file_name, render(mappings))
        .map_err(|err| KindConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

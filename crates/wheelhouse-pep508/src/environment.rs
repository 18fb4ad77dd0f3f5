use serde::{Deserialize, Serialize};

use crate::marker::MarkerVariable;

/// The marker values for a Python interpreter, normally the current one.
///
/// This is the interface the platform probe fills in: every key of the
/// closed PEP 508 set maps to a string, `extra` defaults to the empty
/// string, and the list-valued PEP 751 keys (`extras`, `dependency_groups`)
/// are optional and only defined by default under the lock-file evaluation
/// context.
///
/// See: <https://packaging.python.org/en/latest/specifications/dependency-specifiers/#environment-markers>
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerEnvironment {
    implementation_name: String,
    implementation_version: String,
    os_name: String,
    platform_machine: String,
    platform_python_implementation: String,
    platform_release: String,
    platform_system: String,
    platform_version: String,
    python_full_version: String,
    python_version: String,
    sys_platform: String,
    /// The extra being evaluated. Never undefined; the empty string means
    /// "no extra requested", so `extra == "x"` is simply false.
    #[serde(default)]
    extra: String,
    /// The set of extras under the lock-file context (PEP 751).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extras: Option<Vec<String>>,
    /// The set of dependency groups under the lock-file context (PEP 751).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependency_groups: Option<Vec<String>>,
}

/// A builder for [`MarkerEnvironment`] covering the probe-supplied keys.
///
/// ```
/// use wheelhouse_pep508::{MarkerEnvironment, MarkerEnvironmentBuilder};
///
/// let env = MarkerEnvironment::from(MarkerEnvironmentBuilder {
///     implementation_name: "cpython",
///     implementation_version: "3.12.1",
///     os_name: "posix",
///     platform_machine: "x86_64",
///     platform_python_implementation: "CPython",
///     platform_release: "6.5.0",
///     platform_system: "Linux",
///     platform_version: "#1 SMP",
///     python_full_version: "3.12.1",
///     python_version: "3.12",
///     sys_platform: "linux",
/// });
/// ```
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy)]
pub struct MarkerEnvironmentBuilder<'a> {
    pub implementation_name: &'a str,
    pub implementation_version: &'a str,
    pub os_name: &'a str,
    pub platform_machine: &'a str,
    pub platform_python_implementation: &'a str,
    pub platform_release: &'a str,
    pub platform_system: &'a str,
    pub platform_version: &'a str,
    pub python_full_version: &'a str,
    pub python_version: &'a str,
    pub sys_platform: &'a str,
}

impl From<MarkerEnvironmentBuilder<'_>> for MarkerEnvironment {
    fn from(builder: MarkerEnvironmentBuilder<'_>) -> Self {
        Self {
            implementation_name: builder.implementation_name.to_string(),
            implementation_version: builder.implementation_version.to_string(),
            os_name: builder.os_name.to_string(),
            platform_machine: builder.platform_machine.to_string(),
            platform_python_implementation: builder.platform_python_implementation.to_string(),
            platform_release: builder.platform_release.to_string(),
            platform_system: builder.platform_system.to_string(),
            platform_version: builder.platform_version.to_string(),
            python_full_version: builder.python_full_version.to_string(),
            python_version: builder.python_version.to_string(),
            sys_platform: builder.sys_platform.to_string(),
            extra: String::new(),
            extras: None,
            dependency_groups: None,
        }
    }
}

impl MarkerEnvironment {
    /// The string value of a probe-supplied key, or of `extra`.
    ///
    /// The list-valued keys (`extras`, `dependency_groups`) are not strings
    /// and resolve through [`MarkerEnvironment::extras`] and
    /// [`MarkerEnvironment::dependency_groups`] instead.
    pub(crate) fn get_string(&self, variable: MarkerVariable) -> Option<&str> {
        match variable {
            MarkerVariable::ImplementationName => Some(&self.implementation_name),
            MarkerVariable::ImplementationVersion => Some(&self.implementation_version),
            MarkerVariable::OsName => Some(&self.os_name),
            MarkerVariable::PlatformMachine => Some(&self.platform_machine),
            MarkerVariable::PlatformPythonImplementation => {
                Some(&self.platform_python_implementation)
            }
            MarkerVariable::PlatformRelease => Some(&self.platform_release),
            MarkerVariable::PlatformSystem => Some(&self.platform_system),
            MarkerVariable::PlatformVersion => Some(&self.platform_version),
            MarkerVariable::PythonFullVersion => Some(&self.python_full_version),
            MarkerVariable::PythonVersion => Some(&self.python_version),
            MarkerVariable::SysPlatform => Some(&self.sys_platform),
            MarkerVariable::Extra => Some(&self.extra),
            MarkerVariable::Extras | MarkerVariable::DependencyGroups => None,
        }
    }

    /// The extra being evaluated, empty when none was requested.
    pub fn extra(&self) -> &str {
        &self.extra
    }

    /// The lock-file `extras` list, if set.
    pub fn extras(&self) -> Option<&[String]> {
        self.extras.as_deref()
    }

    /// The lock-file `dependency_groups` list, if set.
    pub fn dependency_groups(&self) -> Option<&[String]> {
        self.dependency_groups.as_deref()
    }

    /// Return a copy with the given `extra` value.
    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Return a copy with the given lock-file `extras` list.
    #[must_use]
    pub fn with_extras(mut self, extras: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extras = Some(extras.into_iter().map(Into::into).collect());
        self
    }

    /// Return a copy with the given lock-file `dependency_groups` list.
    #[must_use]
    pub fn with_dependency_groups(
        mut self,
        groups: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dependency_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }
}

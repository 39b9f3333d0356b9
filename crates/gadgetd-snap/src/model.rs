//! Device model view consumed by the gadget update task.
//!
//! # Design
//! - Only the fields the update pipeline reads are modelled; signatures and
//!   assertion headers belong to the assertion subsystem.
//! - Models are cheap to clone and are stored verbatim in shared state.

use serde::{Deserialize, Serialize};

/// Security grade declared by a model. Models without a grade predate
/// recovery-capable boot layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelGrade {
    /// No grade declared.
    #[default]
    Unset,
    /// Development grade; unsigned snaps allowed.
    Dangerous,
    /// Signed snaps required.
    Signed,
    /// Signed snaps and full disk encryption required.
    Secured,
}

impl ModelGrade {
    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Dangerous => "dangerous",
            Self::Signed => "signed",
            Self::Secured => "secured",
        }
    }
}

/// Device model describing which gadget, kernel and base a device runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Model {
    /// Brand account that signed the model.
    pub brand_id: String,
    /// Model name within the brand.
    pub model: String,
    /// Name of the gadget snap owning the boot layout.
    pub gadget: String,
    /// Name of the kernel snap.
    pub kernel: String,
    /// Name of the base snap, when declared.
    #[serde(default)]
    pub base: Option<String>,
    /// Declared security grade.
    #[serde(default)]
    pub grade: ModelGrade,
    /// Whether the model describes a classic (general purpose) system.
    #[serde(default)]
    pub classic: bool,
}

impl Model {
    /// Construct a model with no base and no grade.
    #[must_use]
    pub fn new(
        brand_id: impl Into<String>,
        model: impl Into<String>,
        gadget: impl Into<String>,
        kernel: impl Into<String>,
    ) -> Self {
        Self {
            brand_id: brand_id.into(),
            model: model.into(),
            gadget: gadget.into(),
            kernel: kernel.into(),
            base: None,
            grade: ModelGrade::Unset,
            classic: false,
        }
    }

    /// Set the base snap.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Set the security grade.
    #[must_use]
    pub const fn with_grade(mut self, grade: ModelGrade) -> Self {
        self.grade = grade;
        self
    }

    /// Name of the gadget snap this model expects.
    #[must_use]
    pub fn gadget_snap_name(&self) -> &str {
        &self.gadget
    }

    /// Whether the model declares any grade.
    #[must_use]
    pub fn has_grade(&self) -> bool {
        self.grade != ModelGrade::Unset
    }

    /// `<brand>/<model>` reference used in logs.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}/{}", self.brand_id, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_grade_and_base() {
        let model = Model::new("canonical", "pc-20", "pc", "pc-kernel")
            .with_base("core20")
            .with_grade(ModelGrade::Signed);
        assert_eq!(model.gadget_snap_name(), "pc");
        assert_eq!(model.base.as_deref(), Some("core20"));
        assert!(model.has_grade());
        assert_eq!(model.reference(), "canonical/pc-20");
    }

    #[test]
    fn model_defaults_missing_optional_fields() -> anyhow::Result<()> {
        let model: Model = serde_json::from_str(
            r#"{"brand-id":"acme","model":"box","gadget":"box-gadget","kernel":"box-kernel"}"#,
        )?;
        assert_eq!(model.grade, ModelGrade::Unset);
        assert!(!model.has_grade());
        assert!(!model.classic);
        Ok(())
    }

    #[test]
    fn grade_labels_are_kebab_case() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&ModelGrade::Secured)?, "\"secured\"");
        assert_eq!(ModelGrade::Dangerous.as_str(), "dangerous");
        Ok(())
    }
}

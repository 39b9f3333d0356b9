//! Update policy selection.

use gadgetd_gadget::UpdatePolicy;

use crate::context::DeviceContext;

/// Remodels update every structure; other operations leave the choice to the
/// update algorithm's default.
#[must_use]
pub const fn select_policy(ctx: &DeviceContext) -> UpdatePolicy {
    if ctx.for_remodeling() {
        UpdatePolicy::Remodel
    } else {
        UpdatePolicy::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gadgetd_snap::Model;

    #[test]
    fn policy_follows_operation_kind() {
        let pc = Model::new("canonical", "pc", "pc", "pc-kernel");
        let pc_b = Model::new("canonical", "pc-b", "pc-b", "pc-kernel");
        assert_eq!(
            select_policy(&DeviceContext::new(pc.clone())),
            UpdatePolicy::Default
        );
        assert_eq!(
            select_policy(&DeviceContext::remodel(pc, pc_b)),
            UpdatePolicy::Remodel
        );
    }
}

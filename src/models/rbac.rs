// src/models/rbac.rs

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use super::auth::Role;

/// O que um usuário pode fazer na aplicação. A tabela abaixo é a única fonte
/// de verdade: o servidor, o cliente e a navegação consultam `allows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ManageUsers,
    ManageLocations,
    ManageInventory,
    TakeInventory,
    ManageProduction,
    CreateProductionRequests,
    RecordBatches,
    RecordWaste,
    ViewReports,
    ViewInventory,
    ViewProduction,
}

const ADMIN_ROLES: &[Role] = &[Role::Admin];
const PRODUCTION_ROLES: &[Role] = &[Role::Admin, Role::ProductionLead];
const LEAD_ROLES: &[Role] = &[Role::Admin, Role::ProductionLead, Role::ShiftLead];
const ALL_ROLES: &[Role] = &Role::ALL;

// capability -> papéis permitidos
pub const CAPABILITY_TABLE: &[(Capability, &[Role])] = &[
    (Capability::ManageUsers, ADMIN_ROLES),
    (Capability::ManageLocations, ADMIN_ROLES),
    (Capability::ManageInventory, LEAD_ROLES),
    (Capability::TakeInventory, LEAD_ROLES),
    (Capability::ManageProduction, PRODUCTION_ROLES),
    (Capability::CreateProductionRequests, LEAD_ROLES),
    (Capability::RecordBatches, PRODUCTION_ROLES),
    (Capability::RecordWaste, LEAD_ROLES),
    (Capability::ViewReports, LEAD_ROLES),
    (Capability::ViewInventory, ALL_ROLES),
    (Capability::ViewProduction, ALL_ROLES),
];

impl Capability {
    pub fn allowed_roles(self) -> &'static [Role] {
        CAPABILITY_TABLE
            .iter()
            .find(|(capability, _)| *capability == self)
            .map(|(_, roles)| *roles)
            .unwrap_or(&[])
    }

    pub fn allows(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lista das capacidades de um papel, na ordem da tabela.
pub fn capabilities_of(role: Role) -> Vec<Capability> {
    CAPABILITY_TABLE
        .iter()
        .filter(|(_, roles)| roles.contains(&role))
        .map(|(capability, _)| *capability)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_manages_users() {
        for role in Role::ALL {
            assert_eq!(Capability::ManageUsers.allows(role), role == Role::Admin, "{role}");
        }
    }

    #[test]
    fn every_role_can_view_inventory_and_production() {
        for role in Role::ALL {
            assert!(Capability::ViewInventory.allows(role));
            assert!(Capability::ViewProduction.allows(role));
        }
    }

    #[test]
    fn team_member_is_read_only() {
        assert_eq!(
            capabilities_of(Role::TeamMember),
            vec![Capability::ViewInventory, Capability::ViewProduction]
        );
    }

    #[test]
    fn shift_lead_takes_inventory_but_does_not_record_batches() {
        assert!(Capability::TakeInventory.allows(Role::ShiftLead));
        assert!(Capability::CreateProductionRequests.allows(Role::ShiftLead));
        assert!(!Capability::RecordBatches.allows(Role::ShiftLead));
        assert!(!Capability::ManageProduction.allows(Role::ShiftLead));
    }

    #[test]
    fn count_reports_are_for_leads_only() {
        for role in Role::ALL {
            assert_eq!(Capability::ViewReports.allows(role), role != Role::TeamMember, "{role}");
        }
    }

    #[test]
    fn every_capability_has_an_entry() {
        let all = [
            Capability::ManageUsers,
            Capability::ManageLocations,
            Capability::ManageInventory,
            Capability::TakeInventory,
            Capability::ManageProduction,
            Capability::CreateProductionRequests,
            Capability::RecordBatches,
            Capability::RecordWaste,
            Capability::ViewReports,
            Capability::ViewInventory,
            Capability::ViewProduction,
        ];
        for capability in all {
            assert!(!capability.allowed_roles().is_empty(), "{capability}");
            assert!(capability.allows(Role::Admin));
        }
    }
}

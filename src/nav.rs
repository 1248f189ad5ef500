//! Role-based sidebar navigation and feature permissions.

use crate::model::Role;

/// A content screen behind a sidebar entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Reports,
    Users,
    Patients,
    MedicalRecords,
    Orders,
    Visits,
    Appointments,
    Billing,
    Inventory,
    Maintenance,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Reports => "Reports",
            View::Users => "Users",
            View::Patients => "Patients",
            View::MedicalRecords => "Medical records",
            View::Orders => "Orders",
            View::Visits => "Visits",
            View::Appointments => "Appointments",
            View::Billing => "Billing",
            View::Inventory => "Inventory",
            View::Maintenance => "Maintenance",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub icon: &'static str,
    pub view: View,
}

const fn entry(label: &'static str, icon: &'static str, view: View) -> NavEntry {
    NavEntry { label, icon, view }
}

const HR_ENTRIES: &[NavEntry] = &[
    entry("Users", "👥", View::Users),
    entry("Patients", "🧑", View::Patients),
    entry("Reports", "📊", View::Reports),
];

const ADMIN_ENTRIES: &[NavEntry] = &[
    entry("Patients", "🧑", View::Patients),
    entry("Appointments", "📅", View::Appointments),
    entry("Billing", "💵", View::Billing),
];

const DOCTOR_ENTRIES: &[NavEntry] = &[
    entry("Patients", "🧑", View::Patients),
    entry("Medical records", "📋", View::MedicalRecords),
    entry("Orders", "💊", View::Orders),
];

const NURSE_ENTRIES: &[NavEntry] = &[
    entry("Patients", "🧑", View::Patients),
    entry("Visits", "🩺", View::Visits),
];

const SUPPORT_ENTRIES: &[NavEntry] = &[
    entry("Inventory", "📦", View::Inventory),
    entry("Maintenance", "🔧", View::Maintenance),
];

/// Ordered sidebar entries for `role`; the first one is the landing view.
pub fn entries_for(role: Role) -> &'static [NavEntry] {
    match role {
        Role::HumanResources => HR_ENTRIES,
        Role::AdministrativeStaff => ADMIN_ENTRIES,
        Role::Doctor => DOCTOR_ENTRIES,
        Role::Nurse => NURSE_ENTRIES,
        Role::InformationSupport => SUPPORT_ENTRIES,
    }
}

pub fn landing_view(role: Role) -> View {
    entries_for(role)[0].view
}

/// Actions gated by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    ManageUsers,
    RegisterPatients,
    ViewPatients,
    ManageMedicalRecords,
    ManageOrders,
    ManagePatientVisits,
    ManageBilling,
    ManageInventory,
    ManageAppointments,
}

pub fn can_access(role: Role, feature: Feature) -> bool {
    use Role::*;
    match feature {
        Feature::ManageUsers => role == HumanResources,
        Feature::RegisterPatients => matches!(role, AdministrativeStaff | HumanResources),
        Feature::ViewPatients => matches!(role, AdministrativeStaff | Doctor | Nurse | HumanResources),
        Feature::ManageMedicalRecords => matches!(role, Doctor | HumanResources),
        Feature::ManageOrders => role == Doctor,
        Feature::ManagePatientVisits => matches!(role, Doctor | Nurse | HumanResources),
        Feature::ManageBilling => matches!(role, AdministrativeStaff | HumanResources),
        Feature::ManageInventory => matches!(role, InformationSupport | HumanResources),
        Feature::ManageAppointments => matches!(role, AdministrativeStaff | HumanResources),
    }
}

/// Feature that allows writes (new/edit/delete) in `view`, if any.
pub fn write_feature(view: View) -> Option<Feature> {
    match view {
        View::Users => Some(Feature::ManageUsers),
        View::Patients => Some(Feature::RegisterPatients),
        View::MedicalRecords => Some(Feature::ManageMedicalRecords),
        View::Appointments => Some(Feature::ManageAppointments),
        View::Billing => Some(Feature::ManageBilling),
        View::Inventory => Some(Feature::ManageInventory),
        View::Orders | View::Visits | View::Reports | View::Maintenance => None,
    }
}

pub fn can_write(role: Role, view: View) -> bool {
    write_feature(view).is_some_and(|f| can_access(role, f))
}

/// Sidebar state: exactly one entry is active at any time.
#[derive(Clone, Debug)]
pub struct Navigator {
    entries: &'static [NavEntry],
    active: usize,
}

impl Navigator {
    pub fn for_role(role: Role) -> Self {
        Self {
            entries: entries_for(role),
            active: 0,
        }
    }

    pub fn entries(&self) -> &'static [NavEntry] {
        self.entries
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> View {
        self.entries[self.active].view
    }

    pub fn is_active(&self, index: usize) -> bool {
        index == self.active
    }

    /// Activate `view` if the role has it; returns the newly active view.
    pub fn select(&mut self, view: View) -> Option<View> {
        let idx = self.entries.iter().position(|e| e.view == view)?;
        self.active = idx;
        Some(view)
    }

    pub fn select_index(&mut self, index: usize) -> Option<View> {
        let entry = self.entries.get(index)?;
        self.active = index;
        Some(entry.view)
    }

    pub fn next(&mut self) -> View {
        self.active = (self.active + 1) % self.entries.len();
        self.active()
    }

    pub fn prev(&mut self) -> View {
        self.active = (self.active + self.entries.len() - 1) % self.entries.len();
        self.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_a_landing_view() {
        assert_eq!(landing_view(Role::HumanResources), View::Users);
        assert_eq!(landing_view(Role::AdministrativeStaff), View::Patients);
        assert_eq!(landing_view(Role::Doctor), View::Patients);
        assert_eq!(landing_view(Role::Nurse), View::Patients);
        assert_eq!(landing_view(Role::InformationSupport), View::Inventory);
    }

    #[test]
    fn selection_keeps_exactly_one_active() {
        let mut nav = Navigator::for_role(Role::HumanResources);
        assert_eq!(nav.select(View::Reports), Some(View::Reports));
        let active: Vec<usize> = (0..nav.entries().len()).filter(|&i| nav.is_active(i)).collect();
        assert_eq!(active, vec![2]);
        assert_eq!(nav.select(View::Inventory), None);
        assert_eq!(nav.active(), View::Reports);
        assert_eq!(nav.next(), View::Users);
        assert_eq!(nav.prev(), View::Reports);
    }

    #[test]
    fn permissions_table() {
        assert!(can_access(Role::HumanResources, Feature::ManageUsers));
        assert!(!can_access(Role::Doctor, Feature::ManageUsers));
        assert!(can_access(Role::Doctor, Feature::ManageOrders));
        assert!(!can_access(Role::HumanResources, Feature::ManageOrders));
        assert!(can_access(Role::Nurse, Feature::ViewPatients));
        assert!(!can_access(Role::InformationSupport, Feature::ViewPatients));
        assert!(can_access(Role::InformationSupport, Feature::ManageInventory));
        assert!(!can_write(Role::Nurse, View::Patients));
        assert!(can_write(Role::AdministrativeStaff, View::Patients));
        assert!(!can_write(Role::Doctor, View::Orders));
    }

    #[test]
    fn nurse_sidebar_has_patients_and_visits_only() {
        let views: Vec<View> = entries_for(Role::Nurse).iter().map(|e| e.view).collect();
        assert_eq!(views, vec![View::Patients, View::Visits]);
    }
}

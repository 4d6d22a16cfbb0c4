//! Vietnamese three-level address model and selection cascade.
//!
//! Address entry is a dependent-dropdown flow: picking a province loads its
//! districts and invalidates any district/ward picked earlier; picking a
//! district loads its wards. The cascade itself is pure state - fetching the
//! option lists is the caller's job, and a failed fetch simply leaves a list
//! empty.

use serde::{Deserialize, Serialize};

use crate::types::{DistrictRef, ProvinceRef, WardRef};

/// A province, the top level of the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    /// Province ref.
    pub id: ProvinceRef,
    /// Display name.
    pub name: String,
}

/// A district within a province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    /// District ref.
    pub id: DistrictRef,
    /// Display name.
    pub name: String,
}

/// A ward within a district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    /// Ward ref.
    pub id: WardRef,
    /// Display name.
    pub name: String,
}

/// A full shipping address as submitted with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient full name.
    pub recipient: String,
    /// Contact phone number.
    pub phone: String,
    /// Street-level address line.
    pub street: String,
    /// Selected ward.
    pub ward: Ward,
    /// Selected district.
    pub district: District,
    /// Selected province.
    pub province: Province,
}

/// Dependent-dropdown state for province, district, and ward selection.
///
/// Selections are only ever made from the currently loaded option lists, and
/// re-selecting an upstream level clears everything downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCascade {
    province: Option<Province>,
    district: Option<District>,
    ward: Option<Ward>,
    districts: Vec<District>,
    wards: Vec<Ward>,
}

impl AddressCascade {
    /// Start with no selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a province, clearing the district and ward levels.
    pub fn select_province(&mut self, province: Province) {
        self.province = Some(province);
        self.district = None;
        self.ward = None;
        self.districts.clear();
        self.wards.clear();
    }

    /// Replace the district options, e.g. after fetching them for the
    /// selected province. An empty list is a valid state (fetch failure).
    pub fn set_districts(&mut self, districts: Vec<District>) {
        self.districts = districts;
    }

    /// Select a district from the loaded options, clearing the ward level.
    ///
    /// Ignored when no province is selected or the ref is not among the
    /// loaded options; the selection is simply left empty.
    pub fn select_district(&mut self, id: &DistrictRef) -> Option<&District> {
        if self.province.is_none() {
            return None;
        }
        self.district = self.districts.iter().find(|d| &d.id == id).cloned();
        self.ward = None;
        self.wards.clear();
        self.district.as_ref()
    }

    /// Replace the ward options for the selected district.
    pub fn set_wards(&mut self, wards: Vec<Ward>) {
        self.wards = wards;
    }

    /// Select a ward from the loaded options.
    pub fn select_ward(&mut self, id: &WardRef) -> Option<&Ward> {
        if self.district.is_none() {
            return None;
        }
        self.ward = self.wards.iter().find(|w| &w.id == id).cloned();
        self.ward.as_ref()
    }

    /// The selected province, if any.
    #[must_use]
    pub const fn province(&self) -> Option<&Province> {
        self.province.as_ref()
    }

    /// The selected district, if any.
    #[must_use]
    pub const fn district(&self) -> Option<&District> {
        self.district.as_ref()
    }

    /// The selected ward, if any.
    #[must_use]
    pub const fn ward(&self) -> Option<&Ward> {
        self.ward.as_ref()
    }

    /// The complete selection, available only once all three levels are set.
    #[must_use]
    pub fn selection(&self) -> Option<(&Province, &District, &Ward)> {
        match (&self.province, &self.district, &self.ward) {
            (Some(p), Some(d), Some(w)) => Some((p, d, w)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn province(id: &str) -> Province {
        Province {
            id: ProvinceRef::new(id),
            name: id.to_owned(),
        }
    }

    fn district(id: &str) -> District {
        District {
            id: DistrictRef::new(id),
            name: id.to_owned(),
        }
    }

    fn ward(id: &str) -> Ward {
        Ward {
            id: WardRef::new(id),
            name: id.to_owned(),
        }
    }

    fn full_cascade() -> AddressCascade {
        let mut cascade = AddressCascade::new();
        cascade.select_province(province("hanoi"));
        cascade.set_districts(vec![district("hoan-kiem"), district("ba-dinh")]);
        cascade.select_district(&DistrictRef::new("hoan-kiem"));
        cascade.set_wards(vec![ward("hang-bac")]);
        cascade.select_ward(&WardRef::new("hang-bac"));
        cascade
    }

    #[test]
    fn test_complete_selection() {
        let cascade = full_cascade();
        let (p, d, w) = cascade.selection().unwrap();
        assert_eq!(p.id, ProvinceRef::new("hanoi"));
        assert_eq!(d.id, DistrictRef::new("hoan-kiem"));
        assert_eq!(w.id, WardRef::new("hang-bac"));
    }

    #[test]
    fn test_reselecting_province_clears_downstream() {
        let mut cascade = full_cascade();
        cascade.select_province(province("danang"));

        assert!(cascade.district().is_none());
        assert!(cascade.ward().is_none());
        assert!(cascade.selection().is_none());
        // Old district options are gone too; a stale ref no longer selects.
        assert!(cascade.select_district(&DistrictRef::new("hoan-kiem")).is_none());
    }

    #[test]
    fn test_reselecting_district_clears_ward() {
        let mut cascade = full_cascade();
        cascade.select_district(&DistrictRef::new("ba-dinh"));

        assert!(cascade.ward().is_none());
        assert!(cascade.selection().is_none());
    }

    #[test]
    fn test_out_of_order_selection_ignored() {
        let mut cascade = AddressCascade::new();
        cascade.set_districts(vec![district("hoan-kiem")]);
        assert!(cascade.select_district(&DistrictRef::new("hoan-kiem")).is_none());

        cascade.select_province(province("hanoi"));
        assert!(cascade.select_ward(&WardRef::new("hang-bac")).is_none());
    }

    #[test]
    fn test_unknown_ref_leaves_selection_empty() {
        let mut cascade = AddressCascade::new();
        cascade.select_province(province("hanoi"));
        cascade.set_districts(vec![district("hoan-kiem")]);

        assert!(cascade.select_district(&DistrictRef::new("nowhere")).is_none());
        assert!(cascade.district().is_none());
    }

    #[test]
    fn test_empty_options_after_failed_fetch() {
        let mut cascade = AddressCascade::new();
        cascade.select_province(province("hanoi"));
        // Fetch failed: caller sets an empty list and the flow stalls quietly.
        cascade.set_districts(Vec::new());
        assert!(cascade.select_district(&DistrictRef::new("hoan-kiem")).is_none());
    }
}

//! Suite registration.
//!
//! Auxiliary-session tests are registered only when the profile says the
//! device has an auxiliary stream; they are absent, not skipped, otherwise.

pub mod common;
pub mod l1;
pub mod l2;
pub mod l3;

use crate::harness::Suite;
use crate::profile::DeviceProfile;

/// Every suite this profile enables, L1 first.
pub fn register(profile: &DeviceProfile) -> Vec<Suite> {
    let mut suites = l1::suites(profile);
    suites.push(l2::suite(profile));
    suites.push(l3::suite(profile));
    for suite in &suites {
        log::debug!("Registered {} with {} tests", suite.name, suite.tests.len());
    }
    suites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Level;

    #[test]
    fn registration_follows_profile() {
        let mut profile = DeviceProfile::fast();
        let names: Vec<_> = register(&profile).iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec![l1::SUITE, l2::SUITE, l3::SUITE]);

        let counts = |p: &DeviceProfile| register(p).iter().map(|s| s.tests.len()).collect::<Vec<_>>();
        assert_eq!(counts(&profile), vec![21, 1, 2]);

        profile.auxsupport = true;
        profile.positive_only_suite = true;
        assert_eq!(counts(&profile), vec![32, 13, 3, 7]);

        let levels: Vec<Level> = register(&profile).iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![Level::L1, Level::L1, Level::L2, Level::L3]);
    }

    #[test]
    fn test_ids_unique_per_level() {
        let mut profile = DeviceProfile::fast();
        profile.auxsupport = true;
        for suite in register(&profile) {
            let mut ids: Vec<u16> = suite.tests.iter().map(|t| t.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), suite.tests.len(), "duplicate id in {}", suite.name);
        }
    }
}

//! MIP learner configuration.

/// How many profiles the learned model may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCount {
    /// Exactly `k` profiles.
    Exact(usize),
    /// Try `1, 2, ..., k` profiles and keep the best fit.
    Max(usize),
}

impl ProfileCount {
    /// Largest number of profiles tried.
    pub fn max(self) -> usize {
        match self {
            ProfileCount::Exact(k) | ProfileCount::Max(k) => k,
        }
    }

    /// Profile counts tried, in order.
    pub fn candidates(self) -> std::ops::RangeInclusive<usize> {
        match self {
            ProfileCount::Exact(k) => k..=k,
            ProfileCount::Max(k) => 1..=k,
        }
    }
}

/// Configuration for the exact learner.
///
/// # Examples
///
/// ```
/// use u_srmp::mip::{MipConfig, ProfileCount};
///
/// let config = MipConfig::default()
///     .with_profiles(ProfileCount::Max(3))
///     .with_inconsistencies(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MipConfig {
    /// Separation margin: strict preferences need a strength gap of at
    /// least `gamma`, discordant values sit at least `gamma` below the
    /// profile, and every weight is at least `gamma`.
    pub gamma: f64,

    /// Tolerate unsatisfiable comparisons and maximize the satisfied
    /// ones. When `false`, every comparison must be reproduced.
    pub inconsistencies: bool,

    pub profiles: ProfileCount,

    /// Solve only this lexicographic order instead of enumerating all.
    pub lexicographic_order: Option<Vec<usize>>,
}

impl Default for MipConfig {
    fn default() -> Self {
        Self {
            gamma: 1e-3,
            inconsistencies: true,
            profiles: ProfileCount::Exact(1),
            lexicographic_order: None,
        }
    }
}

impl MipConfig {
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_inconsistencies(mut self, tolerate: bool) -> Self {
        self.inconsistencies = tolerate;
        self
    }

    pub fn with_profiles(mut self, profiles: ProfileCount) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_lexicographic_order(mut self, order: Vec<usize>) -> Self {
        self.lexicographic_order = Some(order);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(format!("gamma must be in (0, 1), got {}", self.gamma));
        }
        if self.profiles.max() == 0 {
            return Err("at least one profile is required".into());
        }
        if let Some(order) = &self.lexicographic_order {
            match self.profiles {
                ProfileCount::Exact(k) if order.len() == k => {}
                ProfileCount::Exact(k) => {
                    return Err(format!(
                        "fixed order {order:?} does not cover {k} profiles"
                    ))
                }
                ProfileCount::Max(_) => {
                    return Err("a fixed order needs an exact profile count".into())
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MipConfig::default();
        assert!(config.inconsistencies);
        assert_eq!(config.profiles, ProfileCount::Exact(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profile_candidates() {
        assert_eq!(ProfileCount::Exact(3).candidates().collect::<Vec<_>>(), vec![3]);
        assert_eq!(ProfileCount::Max(3).candidates().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_validate_gamma() {
        assert!(MipConfig::default().with_gamma(0.0).validate().is_err());
        assert!(MipConfig::default().with_gamma(1.0).validate().is_err());
    }

    #[test]
    fn test_validate_fixed_order() {
        let ok = MipConfig::default()
            .with_profiles(ProfileCount::Exact(2))
            .with_lexicographic_order(vec![1, 0]);
        assert!(ok.validate().is_ok());
        let short = MipConfig::default()
            .with_profiles(ProfileCount::Exact(3))
            .with_lexicographic_order(vec![1, 0]);
        assert!(short.validate().is_err());
        let open = MipConfig::default()
            .with_profiles(ProfileCount::Max(2))
            .with_lexicographic_order(vec![0]);
        assert!(open.validate().is_err());
        assert!(MipConfig::default()
            .with_profiles(ProfileCount::Exact(0))
            .validate()
            .is_err());
    }
}

//! Cache keys identifying a compiled artifact.

use std::fmt;

use jitc_common::{Crc32, OptLevel};

use crate::header::fixed_string;

/// Everything that determines which object a compilation produces.
///
/// Two keys name the same entry only if all four fields match, with the
/// module id and CPU compared after truncation to their persisted width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// CRC of the serialized module.
    pub module_crc: Crc32,
    /// Module identifier; also the entry's file name.
    pub module_id: String,
    /// Target CPU microarchitecture.
    pub target_cpu: String,
    /// Optimization level.
    pub opt_level: OptLevel,
}

impl CacheKey {
    /// Creates a key from its parts.
    pub fn new(
        module_crc: Crc32,
        module_id: impl Into<String>,
        target_cpu: impl Into<String>,
        opt_level: OptLevel,
    ) -> Self {
        Self {
            module_crc,
            module_id: module_id.into(),
            target_cpu: target_cpu.into(),
            opt_level,
        }
    }

    /// Returns `true` if both keys resolve to the same persisted identity.
    ///
    /// Unlike `==`, ids or CPUs that differ only beyond the persisted width
    /// compare equal here.
    pub fn persisted_eq(&self, other: &CacheKey) -> bool {
        self.module_crc == other.module_crc
            && self.opt_level == other.opt_level
            && fixed_string(&self.module_id) == fixed_string(&other.module_id)
            && fixed_string(&self.target_cpu) == fixed_string(&other.target_cpu)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} [{}, {}]",
            self.module_id, self.module_crc, self.target_cpu, self.opt_level
        )
    }
}

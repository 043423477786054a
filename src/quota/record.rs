//! # Quota counters and rendering helpers.
//!
//! A [`QuotaRecord`] tracks one (tenant, resource-kind) pair. The invariant
//! enforced by [`QuotaGuard`](crate::quota::QuotaGuard) is that `used` never
//! silently exceeds `limit` when `limit > 0`: operations that would overshoot
//! are rejected before they are applied, never rolled back after.

use std::fmt;

/// Resource kinds with per-tenant quotas.
///
/// Disk is gated before admission (workspace writes); CPU is accounted after
/// runs complete and is carried here for the usage report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Workspace disk usage in bytes.
    Disk,
    /// Cumulative CPU usage in milliseconds.
    Cpu,
}

impl ResourceKind {
    /// Stable label for logs and user-visible messages.
    pub fn as_label(&self) -> &'static str {
        match self {
            ResourceKind::Disk => "disk",
            ResourceKind::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Usage counter for one (tenant, resource-kind) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuotaRecord {
    /// Hard limit; `0` = unlimited.
    pub limit: u64,
    /// Currently committed usage.
    pub used: u64,
}

impl QuotaRecord {
    /// Whether this record imposes a limit at all.
    #[inline]
    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }

    /// Whether adding `bytes` would overshoot the limit.
    #[inline]
    pub fn would_exceed(&self, bytes: u64) -> bool {
        self.is_limited() && self.used.saturating_add(bytes) > self.limit
    }

    /// Whether current usage already reaches or exceeds the limit.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.is_limited() && self.used >= self.limit
    }
}

/// Renders a byte count human-readably (binary units, one decimal when the
/// value is not whole).
///
/// Used in quota-excess messages, which are user-visible.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if (value - value.round()).abs() < f64::EPSILON * value.max(1.0) {
        format!("{} {}", value.round() as u64, UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Renders a quota amount in the unit of its resource kind: binary byte
/// units for disk, milliseconds for CPU.
///
/// Takes the kind's stable label so error types can hold a plain `&str`.
pub fn human_amount(resource: &str, value: u64) -> String {
    match resource {
        "cpu" => format!("{value} ms"),
        _ => human_bytes(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_record_never_exceeds() {
        let rec = QuotaRecord { limit: 0, used: u64::MAX };
        assert!(!rec.is_limited());
        assert!(!rec.would_exceed(u64::MAX));
        assert!(!rec.is_exhausted());
    }

    #[test]
    fn boundary_is_inclusive() {
        let rec = QuotaRecord {
            limit: 1000,
            used: 900,
        };
        assert!(!rec.would_exceed(100)); // exactly the limit passes
        assert!(rec.would_exceed(101));
    }

    #[test]
    fn saturating_add_does_not_wrap() {
        let rec = QuotaRecord {
            limit: 1000,
            used: u64::MAX,
        };
        assert!(rec.would_exceed(1));
    }

    #[test]
    fn human_bytes_rendering() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1024), "1 KiB");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(2 * 1024 * 1024 * 1024), "2 GiB");
    }

    #[test]
    fn amount_follows_resource_kind() {
        assert_eq!(human_amount(ResourceKind::Disk.as_label(), 2048), "2 KiB");
        assert_eq!(human_amount(ResourceKind::Cpu.as_label(), 2048), "2048 ms");
    }
}

// Error codes implementation
// This module contains standardized error codes for the VetChart backend

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod lookup {
    pub const NOT_FOUND: &str = "LOOKUP_2001";
}

pub mod upstream {
    pub const UNREACHABLE: &str = "UPSTREAM_3001";
    pub const FAILED: &str = "UPSTREAM_3002";
}

pub mod system {
    pub const INTERNAL: &str = "SYSTEM_4001";
    pub const CONFIGURATION: &str = "SYSTEM_4002";
}

//! Static inter-region round-trip times
//!
//! Approximate median RTTs in milliseconds between well-known region pairs.
//! The table is symmetric; unknown pairs return `None`.

const RTT_MS: &[(&str, &str, u32)] = &[
    ("francecentral", "francesouth", 12),
    ("francecentral", "westeurope", 10),
    ("francecentral", "northeurope", 18),
    ("francecentral", "germanywestcentral", 11),
    ("francecentral", "uksouth", 9),
    ("francecentral", "switzerlandnorth", 12),
    ("francecentral", "italynorth", 19),
    ("francecentral", "spaincentral", 20),
    ("francecentral", "swedencentral", 33),
    ("francecentral", "polandcentral", 27),
    ("francesouth", "westeurope", 20),
    ("francesouth", "germanywestcentral", 17),
    ("francesouth", "italynorth", 12),
    ("westeurope", "northeurope", 18),
    ("westeurope", "germanywestcentral", 8),
    ("westeurope", "uksouth", 8),
    ("westeurope", "swedencentral", 25),
    ("westeurope", "polandcentral", 22),
    ("westeurope", "switzerlandnorth", 14),
    ("northeurope", "uksouth", 12),
    ("germanywestcentral", "germanynorth", 10),
    ("germanywestcentral", "switzerlandnorth", 8),
    ("germanywestcentral", "swedencentral", 24),
    ("germanywestcentral", "polandcentral", 16),
    ("germanywestcentral", "italynorth", 14),
    ("swedencentral", "norwayeast", 9),
    ("uksouth", "ukwest", 6),
    ("eastus", "eastus2", 7),
    ("eastus", "centralus", 25),
    ("eastus", "westus2", 65),
    ("eastus", "westus3", 60),
    ("eastus", "southcentralus", 33),
    ("eastus", "canadacentral", 20),
    ("eastus2", "centralus", 26),
    ("eastus2", "southcentralus", 30),
    ("centralus", "westus2", 40),
    ("westus2", "westus3", 22),
    ("canadacentral", "canadaeast", 11),
    ("japaneast", "japanwest", 9),
    ("australiaeast", "australiasoutheast", 14),
    ("eastus", "westeurope", 80),
    ("eastus", "northeurope", 75),
    ("eastus", "uksouth", 76),
];

/// Round-trip time between two regions; same region is 0
pub fn rtt_ms(from: &str, to: &str) -> Option<u32> {
    let from = from.trim().to_ascii_lowercase();
    let to = to.trim().to_ascii_lowercase();
    if from == to {
        return Some(0);
    }
    RTT_MS
        .iter()
        .find(|(a, b, _)| (*a == from && *b == to) || (*a == to && *b == from))
        .map(|(_, _, rtt)| *rtt)
}

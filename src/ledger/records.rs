//! Change-record decoding.
//!
//! Raw responses describe object types as fully-qualified strings. They are
//! mapped onto the closed [`ObjectTag`] set exactly once, here, keyed by the
//! configured contract package.

use crate::types::ObjectTag;

/// The native coin type tag on the wire
const GAS_COIN_TYPE: &str = "0x2::coin::GAS";

/// Map a raw object type string onto the closed tag set
pub fn decode_tag(package_id: &str, raw: &str) -> ObjectTag {
    if raw == GAS_COIN_TYPE {
        return ObjectTag::GasCoin;
    }
    if raw == format!("{package_id}::mnft::SupplyManager") {
        return ObjectTag::SupplyManager;
    }
    if raw == format!("{package_id}::mnft::M_NFT") {
        return ObjectTag::Minted;
    }
    ObjectTag::Other(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_decode() {
        assert_eq!(decode_tag("0xpkg", "0x2::coin::GAS"), ObjectTag::GasCoin);
        assert_eq!(
            decode_tag("0xpkg", "0xpkg::mnft::SupplyManager"),
            ObjectTag::SupplyManager
        );
        assert_eq!(decode_tag("0xpkg", "0xpkg::mnft::M_NFT"), ObjectTag::Minted);
    }

    #[test]
    fn foreign_package_types_stay_other() {
        // a SupplyManager from some other deployment must not match
        assert_eq!(
            decode_tag("0xpkg", "0xother::mnft::SupplyManager"),
            ObjectTag::Other("0xother::mnft::SupplyManager".into())
        );
    }
}

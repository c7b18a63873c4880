//! Part aliases from a cross-link table.

use mwgeo_geometry::GeometryFile;

use crate::diagnostics::{Diagnostics, Warning};
use crate::names::NameResolver;
use crate::tables::CrossLinkTable;

/// Add a part for every `origin=target` link whose target exists.
///
/// The new part shares the target's buffers under the origin's identity.
/// Links to a missing target, or whose origin already exists, are skipped
/// with a warning. Returns the number of parts added.
pub fn apply_cross_links(
    file: &mut GeometryFile,
    resolver: &NameResolver,
    table: &CrossLinkTable,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut added = 0;

    for link in table {
        let (target_name, target_hash) = resolver.part_hash(&link.target);
        let Some(target) = file.find_part(target_hash) else {
            diagnostics.warn(Warning::NoSuchTargetPart {
                target: link.target.clone(),
                line: link.line,
            });
            continue;
        };

        let (origin_name, origin_hash) = resolver.part_hash(&link.origin);
        if file.contains_part(origin_hash) {
            diagnostics.warn(Warning::PartAlreadyExists {
                origin: link.origin.clone(),
                line: link.line,
            });
            continue;
        }

        log::debug!("cross link {} -> {}", origin_name, target_name);
        let alias = target.alias(origin_hash, origin_name);
        file.add_part(alias);
        added += 1;
    }

    file.sync_part_count();
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwgeo_geometry::{Part, PartData, PartInfo};

    fn file_with(resolver: &NameResolver, names: &[&str]) -> GeometryFile {
        let mut file = GeometryFile::new();
        for name in names {
            let (resolved, hash) = resolver.part_hash(name);
            file.add_part(Part::new(PartInfo::new(hash, resolved), PartData::default()));
        }
        file.sync_part_count();
        file
    }

    #[test]
    fn test_alias_shares_data() {
        let resolver = NameResolver::new("car01");
        let mut file = file_with(&resolver, &["kit00_door"]);
        let table = CrossLinkTable::parse("kit01_door=kit00_door\n");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(apply_cross_links(&mut file, &resolver, &table, &mut diagnostics), 1);
        assert_eq!(file.part_count(), 2);
        assert_eq!(file.info().part_count, 2);

        let alias = &file.parts()[1];
        assert_eq!(alias.name(), "CAR01_KIT01_DOOR");
        assert_eq!(alias.hash(), resolver.part_hash("kit01_door").1);
        assert!(alias.shares_data_with(&file.parts()[0]));
        assert_eq!(file.parts()[0].name(), "CAR01_KIT00_DOOR");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_collision_is_skipped() {
        let resolver = NameResolver::new("car01");
        let mut file = file_with(&resolver, &["a", "b"]);
        let table = CrossLinkTable::parse("A = b\n");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(apply_cross_links(&mut file, &resolver, &table, &mut diagnostics), 0);
        assert_eq!(file.part_count(), 2);
        assert_eq!(
            diagnostics.warnings(),
            [Warning::PartAlreadyExists {
                origin: "A".to_string(),
                line: 1
            }]
        );
    }

    #[test]
    fn test_missing_target() {
        let resolver = NameResolver::new("car01");
        let mut file = file_with(&resolver, &["a"]);
        let table = CrossLinkTable::parse("# header\nc=missing\n");
        let mut diagnostics = Diagnostics::new();

        assert_eq!(apply_cross_links(&mut file, &resolver, &table, &mut diagnostics), 0);
        assert_eq!(
            diagnostics.warnings(),
            [Warning::NoSuchTargetPart {
                target: "missing".to_string(),
                line: 2
            }]
        );
    }
}

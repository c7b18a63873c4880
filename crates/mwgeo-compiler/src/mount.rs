//! Mount points and base parts.
//!
//! Objects named `#NAME` mark attachment positions. Only their translation
//! is kept. Every part compiled from a `BASE_*` object receives the full
//! list of mount points.

use mwgeo_common::Matrix4;
use mwgeo_geometry::{MountPoint, Part};
use mwgeo_source::SourceObject;

use crate::diagnostics::{Diagnostics, Warning};
use crate::names::NameResolver;
use crate::partition::Convention;
use crate::Result;

/// The mount point described by a `#` object.
pub fn mount_point(
    object: &SourceObject,
    convention: &Convention,
    resolver: &NameResolver,
) -> Result<MountPoint> {
    let translation = convention.remap(object.transform.translation());
    Ok(MountPoint {
        hash: resolver.mount_hash(&object.name)?,
        transform: Matrix4::from_translation(translation),
    })
}

/// Give every base part a copy of `mount_points`.
///
/// `base_parts` indexes into `parts`. Returns the number of parts updated;
/// mount points with no base part to carry them are dropped with a warning.
pub fn attach_mount_points(
    parts: &mut [Part],
    base_parts: &[usize],
    mount_points: &[MountPoint],
    diagnostics: &mut Diagnostics,
) -> usize {
    if mount_points.is_empty() {
        return 0;
    }
    if base_parts.is_empty() {
        diagnostics.warn(Warning::MountPointsWithoutBase {
            count: mount_points.len(),
        });
        return 0;
    }

    let mut attached = 0;
    for &index in base_parts {
        if let Some(part) = parts.get_mut(index) {
            log::debug!(
                "attaching {} mount point(s) to {}",
                mount_points.len(),
                part.info.name
            );
            part.info.mount_points = mount_points.to_vec();
            attached += 1;
        }
    }
    attached
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwgeo_common::hash::hash_str;
    use mwgeo_common::{NameHash, Vector3};
    use mwgeo_geometry::{PartData, PartInfo};
    use mwgeo_source::SourceFormat;

    fn mount_object(name: &str, translation: Vector3) -> SourceObject {
        let mut object = SourceObject::new(name);
        object.transform = Matrix4::from_translation(translation);
        object
    }

    #[test]
    fn test_mount_point_axes() {
        let resolver = NameResolver::new("car01");
        let object = mount_object("#wheel_fl[1]", Vector3::new(1.0, 2.0, 3.0));

        let raw = mount_point(
            &object,
            &Convention::for_format(SourceFormat::RawBinary),
            &resolver,
        )
        .unwrap();
        assert_eq!(raw.hash, NameHash(hash_str("WHEEL_FL")));
        assert_eq!(raw.transform.translation(), Vector3::new(3.0, 1.0, 2.0));
        assert_eq!(raw.transform.get(0, 0), 1.0);

        let scene = mount_point(
            &object,
            &Convention::for_format(SourceFormat::SceneExport),
            &resolver,
        )
        .unwrap();
        assert_eq!(scene.transform.translation(), Vector3::new(-2.0, 1.0, 3.0));
    }

    #[test]
    fn test_attach_to_base_parts_only() {
        let mut parts = vec![
            Part::new(PartInfo::new(NameHash(1), "CAR01_BASE_A"), PartData::default()),
            Part::new(PartInfo::new(NameHash(2), "CAR01_DOOR"), PartData::default()),
        ];
        let mounts = [MountPoint {
            hash: NameHash(7),
            transform: Matrix4::IDENTITY,
        }];
        let mut diagnostics = Diagnostics::new();

        assert_eq!(attach_mount_points(&mut parts, &[0], &mounts, &mut diagnostics), 1);
        assert_eq!(parts[0].info.mount_points, mounts);
        assert!(parts[1].info.mount_points.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_mount_points_without_base() {
        let mut parts = vec![Part::new(
            PartInfo::new(NameHash(2), "CAR01_DOOR"),
            PartData::default(),
        )];
        let mounts = [MountPoint {
            hash: NameHash(7),
            transform: Matrix4::IDENTITY,
        }];
        let mut diagnostics = Diagnostics::new();

        assert_eq!(attach_mount_points(&mut parts, &[], &mounts, &mut diagnostics), 0);
        assert!(parts[0].info.mount_points.is_empty());
        assert_eq!(
            diagnostics.warnings(),
            [Warning::MountPointsWithoutBase { count: 1 }]
        );
    }
}

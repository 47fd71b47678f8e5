//! Crate-wide constants.

pub const APP_NAME: &str = "grist";

/// Workspace manifest file name, looked up in the workspace root.
pub const MANIFEST_FILENAME: &str = "grist.json";

/// Environment variable overriding the manifest's object directory.
pub const WORKDIR_ENV: &str = "GRIST_WORKDIR";

/// Environment variable overriding the manifest's package directory.
pub const PKGDIR_ENV: &str = "GRIST_PKGDIR";

/// Default object directory, relative to the workspace root.
pub const DEFAULT_WORKDIR: &str = "_build/obj";

/// Default package directory, relative to the workspace root.
pub const DEFAULT_PKGDIR: &str = "_build/pkg";

/// Sub-directory of the work directory holding per-unit intermediate objects.
/// Kept apart from `<workdir>/<import path>` so it never shadows a linked binary.
pub const UNIT_OBJDIR: &str = "_obj";

/// Sub-directory holding test-scope objects inside a unit's object directory.
pub const TEST_OBJDIR: &str = "_test";

pub const ARCHIVE_EXT: &str = "a";
pub const OBJECT_EXT: &str = "o";

/// Suffix appended to linked test binaries.
pub const TEST_BINARY_SUFFIX: &str = ".test";

/// Suffix of the install marker written next to an installed package.
pub const MARKER_SUFFIX: &str = "grist";

//! Fixed names, paths and payloads shared by the dispatcher and the magician

/// Root of everything the magician adds to an image
pub const MAGIC_ROOT_DIR: &str = "/opt/magic";
pub const BINARIES_SUBDIR: &str = "bin";
pub const MAPPINGS_SUBDIR: &str = "etc";

pub const DOCKER_CONFIG_FILE_BASENAME: &str = "config.json";
/// Docker config written into the image: the dispatcher is the only store
pub const DOCKER_CONFIG_FILE_CONTENTS: &str = "{\"credsStore\":\"magic\"}\n";
pub const DOCKER_HOME_DIR: &str = ".docker";

pub const DOCKER_CREDENTIAL_PREFIX: &str = "docker-credential";
/// Suffix of the dispatcher itself (`docker-credential-magic`)
pub const MAGIC_CREDENTIAL_SUFFIX: &str = "magic";

pub const MAPPING_EXTENSION: &str = "yml";
pub const MAPPING_EXTENSION_ALT: &str = "yaml";

/// Subdirectory of the XDG config home holding the runtime mappings root
pub const XDG_CONFIG_SUBDIR: &str = "magic";
pub const MAGICIAN_CONFIG_FILE_BASENAME: &str = "magician.toml";

pub const ENV_PATH: &str = "PATH";
pub const ENV_DOCKER_CONFIG: &str = "DOCKER_CONFIG";
pub const ENV_DOCKER_ORIG_CONFIG: &str = "DOCKER_ORIG_CONFIG";
pub const ENV_MAGIC_CONFIG: &str = "DOCKER_CREDENTIAL_MAGIC_CONFIG";
/// Log filter for the dispatcher (stdout is reserved for the helper protocol)
pub const ENV_MAGIC_LOG: &str = "MAGIC_LOG";

pub const HELPER_SUBCOMMAND_GET: &str = "get";

/// Printed when no helper and no fallback config can be found
pub const ANONYMOUS_TOKEN_RESPONSE: &str = "{\"Username\":\"\",\"Secret\":\"\"}\n";

/// Username used by Docker to mark a secret as an identity token
pub const IDENTITY_TOKEN_USERNAME: &str = "<token>";

/// Name of the helper binary for a given helper slug, e.g. `docker-credential-gcr`
pub fn helper_binary_name(helper: &str) -> String {
    format!("{}-{}", DOCKER_CREDENTIAL_PREFIX, helper)
}

/// `/opt/magic/bin`
pub fn magic_binaries_dir() -> String {
    format!("{}/{}", MAGIC_ROOT_DIR, BINARIES_SUBDIR)
}

/// `/opt/magic/etc`
pub fn magic_mappings_dir() -> String {
    format!("{}/{}", MAGIC_ROOT_DIR, MAPPINGS_SUBDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_binary_name() {
        assert_eq!(helper_binary_name("gcr"), "docker-credential-gcr");
        assert_eq!(
            helper_binary_name(MAGIC_CREDENTIAL_SUFFIX),
            "docker-credential-magic"
        );
    }

    #[test]
    fn test_magic_dirs() {
        assert_eq!(magic_binaries_dir(), "/opt/magic/bin");
        assert_eq!(magic_mappings_dir(), "/opt/magic/etc");
    }
}

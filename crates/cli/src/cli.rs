//! Command-line arguments.

use clap::Parser;

/// Mirror every file listed in a remote manifest into an S3-compatible bucket.
///
/// Manifest URL, base URL, scratch directory and concurrency come from
/// `MANIFEST_MIRROR_*` environment variables when set.
#[derive(Parser)]
#[command(name = "manifest-mirror", disable_version_flag = true)]
pub struct Cli {
    /// Object store endpoint, e.g. oss-cn-shenzhen.aliyuncs.com
    pub endpoint: String,
    /// Destination bucket
    pub bucket_name: String,
    /// Access key id
    pub access_key_id: String,
    /// Access key secret
    pub access_key_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_positionals() {
        let cli = Cli::try_parse_from([
            "manifest-mirror",
            "oss-cn-shenzhen.aliyuncs.com",
            "static-assets",
            "id",
            "secret",
        ])
        .unwrap();

        assert_eq!(cli.endpoint, "oss-cn-shenzhen.aliyuncs.com");
        assert_eq!(cli.bucket_name, "static-assets");
        assert_eq!(cli.access_key_id, "id");
        assert_eq!(cli.access_key_secret, "secret");
    }

    #[test]
    fn test_missing_argument_is_usage_error() {
        let err = match Cli::try_parse_from(["manifest-mirror", "endpoint", "bucket", "id"]) {
            Err(err) => err,
            Ok(_) => panic!("expected a usage error"),
        };
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_extra_argument_is_usage_error() {
        let result = Cli::try_parse_from([
            "manifest-mirror",
            "endpoint",
            "bucket",
            "id",
            "secret",
            "extra",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_version_flag() {
        let result = Cli::try_parse_from(["manifest-mirror", "--version"]);
        assert!(result.is_err());
        let err = match result {
            Err(err) => err,
            Ok(_) => unreachable!(),
        };
        assert_ne!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}

use aws_config::BehaviorVersion;
use aws_config::ConfigLoader;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;

/// Builds the client once at startup; credentials come from the standard AWS chain.
pub async fn create_s3_client(region: Option<String>) -> S3Client {
    let aws_config = ConfigLoader::default()
        .region(region.map(Region::new))
        .behavior_version(BehaviorVersion::latest())
        .load()
        .await;

    S3Client::new(&aws_config)
}

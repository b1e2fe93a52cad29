use shadow_rs::ShadowBuilder;

fn main() {
    // Embeds version and git metadata for `cronmail --version`
    ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build metadata");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the proto file for the emotion classifier client
    tonic_build::compile_protos("../../proto/emotion.proto")?;
    Ok(())
}

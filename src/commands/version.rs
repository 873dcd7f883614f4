use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("boxwatch version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

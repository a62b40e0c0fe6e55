use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    util::run_main("simpleinterp", simpleinterp::run)?;
    Ok(())
}

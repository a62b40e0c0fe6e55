use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    util::run_main("opinterp3", opinterp3::run)?;
    Ok(())
}

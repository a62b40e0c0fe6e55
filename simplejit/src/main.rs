use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    util::run_main("simplejit", simplejit::run)?;
    Ok(())
}

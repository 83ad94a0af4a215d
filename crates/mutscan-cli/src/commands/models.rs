use mutscan_plms::ModelSpec;

pub fn execute() -> anyhow::Result<()> {
    for name in ModelSpec::hub_names() {
        println!("{}", name);
    }
    println!("onnx:<path>");
    println!("msa-onnx:<path>");
    Ok(())
}

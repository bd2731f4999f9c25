//! Lists the serial ports a session could connect to.

fn main() {
    match serial_heatmap::available_ports() {
        Ok(ports) if ports.is_empty() => println!("No ports found."),
        Ok(ports) => {
            for port in ports {
                println!("{}", port);
            }
        }
        Err(e) => eprintln!("Could not enumerate ports: {}", e),
    }
}

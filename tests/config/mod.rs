// Configuration for integration tests. This crate is about interacting with real serial ports and
// so some tests need actual hardware.

use envconfig::Envconfig;
use rstest::fixture;

// Configuration for tests requiring actual hardware.
//
// For conveniently pulling this configuration into a test case as a parameter, you might want to
// use the test fixture [`hw_config`].
#[derive(Clone, Debug, Envconfig, Eq, PartialEq)]
pub struct HardwareConfig {
    /// Port the device under test is attached to. Its firmware must answer `"{x},{y};"` with
    /// rows of integers.
    #[envconfig(from = "SERIAL_HEATMAP_TEST_DEVICE")]
    pub device: String,
    #[envconfig(from = "SERIAL_HEATMAP_TEST_BAUD_RATE", default = "9600")]
    pub baud_rate: u32,
}

// Test fixture for conveniently pulling the actual hardware configuration into test cases.
//
// See [`fixture`](rstest::fixture) for details.
#[fixture]
pub fn hw_config() -> HardwareConfig {
    HardwareConfig::init_from_env().unwrap()
}

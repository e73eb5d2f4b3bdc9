pub mod serial_json;

pub struct RunArgs {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub listen: Option<String>,
}

fn main() -> anyhow::Result<()> {
    geotrace::geotrace()
}

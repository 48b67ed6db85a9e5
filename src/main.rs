fn main() -> anyhow::Result<()> {
    debate_timer_lib::run()
}

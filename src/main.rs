fn main() {
    context_flow_lib::run()
}

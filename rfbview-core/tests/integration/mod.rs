mod session_routing_tests;

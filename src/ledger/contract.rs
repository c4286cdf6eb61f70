// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GitHub verifier contract bindings.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IGitHubVerifier {
        function verifyUserWallet(address wallet, string githubUsername, bytes32 verificationHash) external;
        function getWalletGitHubInfo(address wallet) external view returns (string username, bool verified, uint256 timestamp);
        function getWalletByGitHub(string githubUsername) external view returns (address wallet);
    }
}
